use {
    crate::{
        App,
        meter::Meter,
        render::{
            Coords, Drawable, Handle, Layout, Line, Paint, Renderer, Scene, Surface,
            SurfaceError, Text,
        },
        sampler::Tick,
        series::Metric,
    },
    crossbeam_channel::RecvTimeoutError,
    crossterm::{
        ExecutableCommand, QueueableCommand, cursor,
        event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
        style::{self, Attribute, Color},
        terminal,
    },
    log::{debug, info, trace, warn},
    std::{
        io::{self, Write},
        thread,
        time::Duration,
    },
};

/// a drawing surface on a terminal.
///
/// the pixel-space scene is rasterized onto a grid of cells. only cells that changed since the
/// last frame are written out, and only those that fit on the terminal.
pub struct TerminalSurface<W: Write> {
    out: W,
    scene: Scene,
    /// pixels per terminal column.
    cell_width: i32,
    /// the rows of the layout, top to bottom.
    bands: Vec<Band>,
    opacity: f64,
    /// what is currently on screen.
    front: Grid,
    /// the size of the terminal, in cells.
    visible: (u16, u16),
    /// set when the screen no longer matches `front`.
    stale: bool,
}

/// how many pixels one terminal cell covers.
///
/// a row whose height is not a multiple of `height` is drawn with shorter cells, the tallest
/// that divide it evenly.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CellSize {
    pub width: u32,
    pub height: u32,
}

/// a horizontal strip of the layout, drawn onto whole terminal rows.
///
/// bands are a whole number of cells tall, so the baseline of every metric row lies on a cell
/// boundary and bars always fill their cells from the bottom.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Band {
    /// the first pixel row of the band.
    top: i32,
    /// height in pixels.
    height: i32,
    /// pixels per terminal row.
    cell_height: u32,
    /// the first terminal row of the band.
    first_row: i32,
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct Grid {
    cols: u16,
    rows: u16,
    cells: Vec<Cell>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Cell {
    glyph: char,
    paint: Option<Paint>,
    /// row separators are drawn as an underline, beneath whatever the cell holds.
    underline: bool,
}

/// what the ui loop should do after handling terminal events.
#[derive(Debug, Eq, PartialEq)]
enum Control {
    Continue,
    Quit,
}

/// puts the terminal into raw mode on the alternate screen, until dropped.
struct TerminalGuard;

impl App {
    /// how many completed ticks may wait for the renderer.
    const BACKLOG: usize = 4;

    /// how long the ui waits for a tick before checking for input.
    const POLL: Duration = Duration::from_millis(50);

    /// runs the application.
    ///
    /// the sampler runs on a background thread. drawing only ever happens on this one.
    pub fn run(self) -> Result<(), crate::Error> {
        let Self { config, sampler } = self;

        let devices = sampler.store().devices().cloned().collect::<Vec<_>>();
        let render = config.render_config(devices.len());

        let (tx, rx) = crossbeam_channel::bounded::<Tick>(Self::BACKLOG);
        let interval = config.interval();
        thread::Builder::new()
            .name("iotach-sampler".to_owned())
            .spawn(move || sampler.run(interval, tx))?;

        let _terminal = TerminalGuard::enter()?;
        let mut surface = TerminalSurface::new(
            io::stdout(),
            &render.layout,
            config.cell_size(),
            config.opacity,
        );
        let (cols, rows) = terminal::size()?;
        surface.clip(cols, rows);
        let (needed_cols, needed_rows) = surface.size();
        if needed_cols > cols || needed_rows > rows {
            warn!(
                "the graph needs {needed_cols}x{needed_rows} cells, \
                 but the terminal is {cols}x{rows}; it will be cut off"
            );
        }

        let mut renderer = Renderer::initialize_layout(surface, render, &devices)?;
        info!(
            "drawing {} devices on a {}x{} pixel surface",
            devices.len(),
            render.layout.width(),
            render.layout.height()
        );

        loop {
            if Self::handle_events(renderer.surface_mut())? == Control::Quit {
                debug!("quit requested");
                return Ok(());
            }

            match rx.recv_timeout(Self::POLL) {
                Ok(tick) => {
                    // skip straight to the newest complete tick.
                    let Tick { seq, store } = rx.try_iter().last().unwrap_or(tick);
                    trace!("rendering tick {seq}");
                    renderer.render(&store)?;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("sampler has stopped");
                    return Ok(());
                }
            }
        }
    }

    /// drains pending terminal events.
    fn handle_events<W: Write>(surface: &mut TerminalSurface<W>) -> Result<Control, crate::Error> {
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(KeyEvent {
                    code,
                    modifiers,
                    kind: KeyEventKind::Press,
                    ..
                }) => match code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(Control::Quit),
                    KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(Control::Quit);
                    }
                    _ => {}
                },
                Event::Resize(cols, rows) => {
                    debug!("terminal resized to {cols}x{rows}");
                    surface.clip(cols, rows);
                    surface.invalidate()?;
                    surface.present()?;
                }
                _ => {}
            }
        }

        Ok(Control::Continue)
    }
}

// === impl TerminalSurface ===

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, layout: &Layout, cell: CellSize, opacity: f64) -> Self {
        let cell_width = cell.width.max(1);
        let bands = Band::split(layout, cell.height.max(1));

        let cols = layout.width().div_ceil(cell_width);
        let rows = bands.last().map_or(0, |band| band.first_row + band.rows());
        let front = Grid::new(
            cols.try_into().unwrap_or(u16::MAX),
            rows.try_into().unwrap_or(u16::MAX),
        );

        Self {
            out,
            scene: Scene::default(),
            cell_width: cell_width.try_into().unwrap_or(i32::MAX),
            bands,
            opacity: opacity.clamp(0.0, 1.0),
            front,
            visible: (u16::MAX, u16::MAX),
            stale: true,
        }
    }

    /// the number of columns and rows the whole graph takes up.
    pub fn size(&self) -> (u16, u16) {
        (self.front.cols, self.front.rows)
    }

    /// limits drawing to the top-left `cols` by `rows` cells.
    ///
    /// cells beyond the terminal are never written: the terminal would pile them up on its last
    /// row or column.
    pub fn clip(&mut self, cols: u16, rows: u16) {
        self.visible = (cols, rows);
    }

    /// forces the next [`Surface::present()`] to repaint every cell.
    pub fn invalidate(&mut self) -> Result<(), SurfaceError> {
        self.out
            .queue(terminal::Clear(terminal::ClearType::All))
            .map(drop)?;
        self.stale = true;
        Ok(())
    }

    /// rasterizes the scene onto a fresh grid.
    fn rasterize(&self) -> Grid {
        let mut grid = Grid::new(self.front.cols, self.front.rows);

        for drawable in self.scene.iter() {
            match drawable {
                Drawable::Line(Line {
                    coords,
                    paint: Paint::Separator,
                }) => self.separator(&mut grid, coords),
                Drawable::Line(Line { coords, paint }) if coords.x0 == coords.x1 => {
                    self.bar(&mut grid, coords, *paint)
                }
                // only vertical bars and axis-aligned separators are drawn.
                Drawable::Line(_) => {}
                Drawable::Text(text) => self.text(&mut grid, text),
            }
        }

        grid
    }

    /// draws a vertical bar standing on the bottom of the band it ends in.
    fn bar(&self, grid: &mut Grid, coords: &Coords, paint: Paint) {
        let (top, bottom) = (coords.y0.min(coords.y1), coords.y0.max(coords.y1));
        let Some(band) = self.band(bottom.saturating_sub(1)) else {
            return;
        };

        let meter = Meter {
            top: top.max(band.top) - band.top,
            bottom: bottom - band.top,
        };
        let col = self.col(coords.x0);
        for (row, glyph) in meter.cells(band.cell_height) {
            grid.set(col, band.first_row + row, glyph, paint);
        }
    }

    /// vertical separators are drawn as lines. horizontal ones underline the cells just above
    /// them, which leaves the cells below free for the bars standing there.
    fn separator(&self, grid: &mut Grid, coords: &Coords) {
        let Coords { x0, y0, x1, y1 } = *coords;

        if x0 == x1 {
            let col = self.col(x0);
            let first = self.row(y0.min(y1));
            let last = self.row(y0.max(y1).saturating_sub(1));
            if let (Some(first), Some(last)) = (first, last) {
                for row in first..=last {
                    grid.set(col, row, '│', Paint::Separator);
                }
            }
        } else if y0 == y1 {
            let Some(row) = self.row(y0.saturating_sub(1)) else {
                return;
            };
            for col in self.col(x0.min(x1))..=self.col(x0.max(x1).saturating_sub(1)) {
                grid.underline(col, row);
            }
        }
    }

    /// draws text centered on its anchor.
    fn text(&self, grid: &mut Grid, text: &Text) {
        let Text { x, y, text, paint } = text;
        let Some(row) = self.row(*y) else {
            return;
        };

        let len = text.chars().count() as i32;
        let start = self.col(*x) - len / 2;
        for (i, glyph) in text.chars().enumerate() {
            grid.set(start + i as i32, row, glyph, *paint);
        }
    }

    /// the band holding pixel row `y`.
    fn band(&self, y: i32) -> Option<&Band> {
        self.bands.iter().find(|band| band.contains(y))
    }

    /// the terminal row holding pixel row `y`.
    fn row(&self, y: i32) -> Option<i32> {
        self.band(y).map(|band| band.row(y))
    }

    /// the terminal column holding pixel column `x`.
    fn col(&self, x: i32) -> i32 {
        x.div_euclid(self.cell_width)
    }

    /// the colour of a paint, dimmed toward the black background by the opacity.
    fn color(&self, paint: Paint) -> Color {
        let (r, g, b) = match paint {
            Paint::Read => (0, 192, 0),
            Paint::Write => (255, 165, 0),
            Paint::Latency => (255, 255, 0),
            Paint::Queue => (0, 204, 255),
            Paint::Separator => (34, 34, 34),
            Paint::Label => (255, 255, 255),
        };
        let blend = |c: u8| (f64::from(c) * self.opacity).round() as u8;

        Color::Rgb {
            r: blend(r),
            g: blend(g),
            b: blend(b),
        }
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn create_line(&mut self, line: Line) -> Result<Handle, SurfaceError> {
        Ok(self.scene.insert(Drawable::Line(line)))
    }

    fn create_text(&mut self, text: Text) -> Result<Handle, SurfaceError> {
        Ok(self.scene.insert(Drawable::Text(text)))
    }

    fn reposition(&mut self, handle: Handle, coords: Coords) -> Result<(), SurfaceError> {
        self.scene.reposition(handle, coords)
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        let back = self.rasterize();
        let (cols, rows) = self.visible;

        let mut written = 0;
        for (i, cell) in back.cells.iter().enumerate() {
            if !self.stale && self.front.cells[i] == *cell {
                continue;
            }
            let (col, row) = back.position(i);
            if col >= cols || row >= rows {
                continue;
            }

            self.out.queue(cursor::MoveTo(col, row))?;
            if let Some(paint) = cell.paint {
                let color = self.color(paint);
                self.out.queue(style::SetForegroundColor(color))?;
            }
            let underline = if cell.underline {
                Attribute::Underlined
            } else {
                Attribute::NoUnderline
            };
            self.out.queue(style::SetAttribute(underline))?;
            self.out.queue(style::Print(cell.glyph))?;
            written += 1;
        }

        self.out.queue(style::SetAttribute(Attribute::Reset))?;
        self.out.queue(style::ResetColor)?;
        self.out.flush()?;
        trace!("wrote {written} cells");

        self.front = back;
        self.stale = false;
        Ok(())
    }
}

// === impl Band ===

impl Band {
    /// splits the layout's rows and margin into bands of cells at most `cell_height` tall.
    fn split(layout: &Layout, cell_height: u32) -> Vec<Self> {
        let heights = Metric::ALL
            .map(|metric| layout.row_height(metric))
            .into_iter()
            .chain([layout.margin]);

        let mut bands: Vec<Self> = Vec::new();
        let (mut top, mut first_row) = (0_i32, 0_i32);
        for height in heights.filter(|height| *height > 0) {
            let band = Self {
                top,
                height: height.try_into().unwrap_or(i32::MAX),
                cell_height: Self::fit(height, cell_height),
                first_row,
            };
            top = top.saturating_add(band.height);
            first_row = first_row.saturating_add(band.rows());
            bands.push(band);
        }

        bands
    }

    /// the tallest cell, no taller than `max`, that divides `height` evenly.
    fn fit(height: u32, max: u32) -> u32 {
        (1..=max.min(height))
            .rev()
            .find(|cell| height % cell == 0)
            .unwrap_or(1)
    }

    fn rows(&self) -> i32 {
        self.height / self.cell_height as i32
    }

    fn contains(&self, y: i32) -> bool {
        (self.top..self.top.saturating_add(self.height)).contains(&y)
    }

    fn row(&self, y: i32) -> i32 {
        self.first_row + (y - self.top) / self.cell_height as i32
    }
}

// === impl Grid ===

impl Grid {
    fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            cells: vec![Cell::BLANK; cols as usize * rows as usize],
        }
    }

    fn index(&self, col: i32, row: i32) -> Option<usize> {
        let in_bounds =
            (0..self.cols as i32).contains(&col) && (0..self.rows as i32).contains(&row);
        in_bounds.then(|| row as usize * self.cols as usize + col as usize)
    }

    fn get(&self, col: i32, row: i32) -> Option<&Cell> {
        self.index(col, row).map(|i| &self.cells[i])
    }

    /// paints a cell. cells outside the grid are ignored.
    fn set(&mut self, col: i32, row: i32, glyph: char, paint: Paint) {
        if let Some(i) = self.index(col, row) {
            let cell = &mut self.cells[i];
            cell.glyph = glyph;
            cell.paint = Some(paint);
        }
    }

    fn underline(&mut self, col: i32, row: i32) {
        if let Some(i) = self.index(col, row) {
            let cell = &mut self.cells[i];
            cell.underline = true;
            cell.paint.get_or_insert(Paint::Separator);
        }
    }

    fn position(&self, index: usize) -> (u16, u16) {
        let cols = self.cols.max(1) as usize;
        ((index % cols) as u16, (index / cols) as u16)
    }
}

impl Cell {
    const BLANK: Self = Self {
        glyph: ' ',
        paint: None,
        underline: false,
    };
}

// === impl TerminalGuard ===

impl TerminalGuard {
    fn enter() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        io::stdout()
            .execute(terminal::EnterAlternateScreen)?
            .execute(terminal::Clear(terminal::ClearType::All))?
            .execute(cursor::Hide)
            .map(|_| Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = io::stdout()
            .execute(cursor::Show)
            .and_then(|out| out.execute(terminal::LeaveAlternateScreen));
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Layout {
        Layout {
            columns: 4,
            column_width: 1,
            row_height: 20,
            small_row_height: 10,
            margin: 20,
            devices: 2,
        }
    }

    fn cell(height: u32) -> CellSize {
        CellSize { width: 1, height }
    }

    fn surface() -> TerminalSurface<Vec<u8>> {
        TerminalSurface::new(Vec::new(), &layout(), cell(10), 1.0)
    }

    fn row(grid: &Grid, row: i32) -> String {
        (0..grid.cols as i32)
            .map(|col| grid.get(col, row).map_or('?', |cell| cell.glyph))
            .collect()
    }

    fn underlined(grid: &Grid, row: i32) -> String {
        (0..grid.cols as i32)
            .map(|col| match grid.get(col, row) {
                Some(Cell {
                    underline: true, ..
                }) => '_',
                _ => ' ',
            })
            .collect()
    }

    fn separator(surface: &mut TerminalSurface<Vec<u8>>, coords: Coords) {
        let paint = Paint::Separator;
        surface.create_line(Line { coords, paint }).unwrap();
    }

    fn output(surface: &mut TerminalSurface<Vec<u8>>) -> String {
        String::from_utf8(std::mem::take(&mut surface.out)).unwrap()
    }

    #[test]
    fn grid_covers_the_layout() {
        let surface = surface();
        assert_eq!(surface.size(), (8, 8));
    }

    #[test]
    fn default_graph_fits_a_small_terminal() {
        let layout = Layout {
            columns: 10,
            column_width: 1,
            row_height: 200,
            small_row_height: 10,
            margin: 20,
            devices: 7,
        };
        let surface = TerminalSurface::new(Vec::new(), &layout, cell(20), 0.5);
        assert_eq!(surface.size(), (70, 23));

        let heights = surface.bands.iter().map(|band| band.cell_height).collect::<Vec<_>>();
        assert_eq!(heights, vec![20, 20, 10, 10, 20]);
    }

    #[test]
    fn rows_are_whole_cells() {
        let layout = Layout {
            row_height: 205,
            ..layout()
        };
        let mut surface = TerminalSurface::new(Vec::new(), &layout, cell(10), 1.0);
        assert_eq!(surface.size(), (8, 41 + 41 + 1 + 1 + 2));

        // five pixels standing on the read baseline fill the cell just above it.
        surface
            .create_line(Line {
                coords: Coords::vertical(0, 205, 200),
                paint: Paint::Read,
            })
            .unwrap();
        let grid = surface.rasterize();
        assert_eq!(row(&grid, 40), "█       ");
        assert_eq!(row(&grid, 39), "        ");
    }

    #[test]
    fn separators_underline_the_row_above() {
        let mut surface = surface();
        separator(&mut surface, Coords::vertical(4, 0, 80));
        separator(&mut surface, Coords::horizontal(20, 0, 8));
        separator(&mut surface, Coords::horizontal(50, 0, 8));
        surface
            .create_line(Line {
                coords: Coords::vertical(0, 20, 0),
                paint: Paint::Read,
            })
            .unwrap();

        let grid = surface.rasterize();
        assert_eq!(row(&grid, 0), "█   │   ");
        assert_eq!(row(&grid, 1), "█   │   ");
        assert_eq!(underlined(&grid, 1), "________");
        assert_eq!(underlined(&grid, 2), "        ");

        // the latency baseline stays out of the one-cell queue row below it.
        assert_eq!(underlined(&grid, 4), "________");
        assert_eq!(row(&grid, 5), "    │   ");
        assert_eq!(underlined(&grid, 5), "        ");
    }

    #[test]
    fn bars_and_labels() {
        let mut surface = surface();
        let bar = surface
            .create_line(Line {
                coords: Coords::vertical(1, 20, 20),
                paint: Paint::Read,
            })
            .unwrap();
        surface
            .create_text(Text {
                x: 6,
                y: 70,
                text: "sdb".to_owned(),
                paint: Paint::Label,
            })
            .unwrap();

        let grid = surface.rasterize();
        assert_eq!(row(&grid, 1), "        ");
        assert_eq!(row(&grid, 7), "     sdb");

        surface.reposition(bar, Coords::vertical(1, 20, 5)).unwrap();
        let grid = surface.rasterize();
        assert_eq!(row(&grid, 0), " ▄      ");
        assert_eq!(row(&grid, 1), " █      ");
    }

    #[test]
    fn present_writes_only_changed_cells() {
        let mut surface = surface();
        let bar = surface
            .create_line(Line {
                coords: Coords::vertical(0, 20, 20),
                paint: Paint::Write,
            })
            .unwrap();

        // the first frame paints everything.
        surface.present().unwrap();
        assert!(!output(&mut surface).is_empty());

        surface.present().unwrap();
        let idle = output(&mut surface);

        surface.reposition(bar, Coords::vertical(0, 20, 10)).unwrap();
        surface.present().unwrap();
        let moved = output(&mut surface);

        assert!(idle.len() < moved.len());
        assert!(moved.contains('█'));
        assert!(!idle.contains('█'));
    }

    #[test]
    fn present_stays_inside_the_terminal() {
        let mut surface = surface();
        surface.clip(8, 2);
        surface.present().unwrap();

        // `MoveTo` is one-based on the wire: rows 0 and 1 are `ESC[1;` and `ESC[2;`.
        let clipped = output(&mut surface);
        assert!(clipped.contains("\x1b[2;"));
        assert!(!clipped.contains("\x1b[3;"));

        // growing the terminal repaints the rows that were hidden.
        surface.clip(8, 8);
        surface.invalidate().unwrap();
        surface.present().unwrap();
        assert!(output(&mut surface).contains("\x1b[8;"));
    }

    #[test]
    fn unknown_handle() {
        let mut surface = surface();
        let err = surface.reposition(Handle(7), Coords::default()).unwrap_err();
        assert!(matches!(err, SurfaceError::UnknownHandle(Handle(7))));
    }

    #[test]
    fn opacity_dims_colours() {
        let surface = TerminalSurface::new(Vec::new(), &layout(), cell(10), 0.5);
        assert_eq!(
            surface.color(Paint::Label),
            Color::Rgb {
                r: 128,
                g: 128,
                b: 128
            }
        );
    }
}
