use std::io;

/// a persistent reference to a drawable on a [`Surface`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Handle(pub(crate) u32);

/// the endpoints of a line, in pixels. the origin is the top-left corner.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Coords {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

/// what a drawable depicts, which decides how a surface colours it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Paint {
    Read,
    Write,
    Latency,
    Queue,
    Separator,
    Label,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Line {
    pub coords: Coords,
    pub paint: Paint,
}

/// a run of text, centered horizontally on `(x, y)`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Text {
    pub x: i32,
    pub y: i32,
    pub text: String,
    pub paint: Paint,
}

/// anything that can be placed on a surface.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Drawable {
    Line(Line),
    Text(Text),
}

/// a retained-mode drawing surface.
///
/// drawables live until the surface is dropped. callers create them once, and move them with
/// [`Surface::reposition()`] afterwards. changes become visible on [`Surface::present()`].
pub trait Surface {
    fn create_line(&mut self, line: Line) -> Result<Handle, SurfaceError>;

    fn create_text(&mut self, text: Text) -> Result<Handle, SurfaceError>;

    /// moves a drawable. text is anchored at `(x0, y0)`.
    fn reposition(&mut self, handle: Handle, coords: Coords) -> Result<(), SurfaceError>;

    fn present(&mut self) -> Result<(), SurfaceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("drawing surface is unavailable: {0}")]
    Unavailable(#[from] io::Error),
    #[error("no drawable with handle {0:?}")]
    UnknownHandle(Handle),
}

/// an ordered collection of drawables, addressed by [`Handle`].
///
/// later drawables are painted over earlier ones.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    drawables: Vec<Drawable>,
}

/// a surface that records what is drawn on it.
#[derive(Debug, Default)]
#[allow(dead_code, reason = "this is a testing utility.")]
pub struct RecordingSurface {
    pub scene: Scene,
    pub repositions: usize,
    pub presents: usize,
}

// === impl Coords ===

impl Coords {
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// a vertical line at `x`, spanning `y0` to `y1`.
    pub const fn vertical(x: i32, y0: i32, y1: i32) -> Self {
        Self::new(x, y0, x, y1)
    }

    /// a horizontal line at `y`, spanning `x0` to `x1`.
    pub const fn horizontal(y: i32, x0: i32, x1: i32) -> Self {
        Self::new(x0, y, x1, y)
    }
}

// === impl Drawable ===

impl Drawable {
    fn reposition(&mut self, coords: Coords) {
        match self {
            Self::Line(line) => line.coords = coords,
            Self::Text(text) => {
                text.x = coords.x0;
                text.y = coords.y0;
            }
        }
    }
}

// === impl Scene ===

impl Scene {
    pub fn insert(&mut self, drawable: Drawable) -> Handle {
        let handle = Handle(self.drawables.len() as u32);
        self.drawables.push(drawable);
        handle
    }

    pub fn get(&self, handle: Handle) -> Option<&Drawable> {
        let Handle(index) = handle;
        self.drawables.get(index as usize)
    }

    pub fn reposition(&mut self, handle: Handle, coords: Coords) -> Result<(), SurfaceError> {
        let Handle(index) = handle;
        self.drawables
            .get_mut(index as usize)
            .ok_or(SurfaceError::UnknownHandle(handle))
            .map(|drawable| drawable.reposition(coords))
    }

    /// returns the drawables in painting order.
    pub fn iter(&self) -> impl Iterator<Item = &Drawable> + '_ {
        self.drawables.iter()
    }

    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }
}

// === impl RecordingSurface ===

#[allow(dead_code, reason = "this is a testing utility.")]
impl RecordingSurface {
    /// the number of drawables created so far.
    pub fn created(&self) -> usize {
        self.scene.len()
    }

    /// returns a line, if the handle refers to one.
    pub fn line(&self, handle: Handle) -> Option<&Line> {
        match self.scene.get(handle)? {
            Drawable::Line(line) => Some(line),
            Drawable::Text(_) => None,
        }
    }

    /// returns every line of the given paint, in creation order.
    pub fn lines(&self, paint: Paint) -> impl Iterator<Item = &Line> + '_ {
        self.scene.iter().filter_map(move |d| match d {
            Drawable::Line(line) if line.paint == paint => Some(line),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &Text> + '_ {
        self.scene.iter().filter_map(|d| match d {
            Drawable::Text(text) => Some(text),
            Drawable::Line(_) => None,
        })
    }
}

impl Surface for RecordingSurface {
    fn create_line(&mut self, line: Line) -> Result<Handle, SurfaceError> {
        Ok(self.scene.insert(Drawable::Line(line)))
    }

    fn create_text(&mut self, text: Text) -> Result<Handle, SurfaceError> {
        Ok(self.scene.insert(Drawable::Text(text)))
    }

    fn reposition(&mut self, handle: Handle, coords: Coords) -> Result<(), SurfaceError> {
        self.scene.reposition(handle, coords)?;
        self.repositions += 1;
        Ok(())
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        self.presents += 1;
        Ok(())
    }
}
