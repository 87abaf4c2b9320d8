/// Window size of a console, in character cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WinSize {
    /// Height of the console
    pub height: u16,
    /// Width of the console
    pub width: u16,
    // Pixel dimensions reserved by the OS; left at zero by this layer.
    #[allow(dead_code)]
    x_pixel: u16,
    #[allow(dead_code)]
    y_pixel: u16,
}

impl WinSize {
    pub const fn new(height: u16, width: u16) -> Self {
        Self {
            height,
            width,
            x_pixel: 0,
            y_pixel: 0,
        }
    }
}

impl std::fmt::Display for WinSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
