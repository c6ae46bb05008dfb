pub const GREEN: (u8, u8, u8) = (139, 195, 74);
pub const LIME: (u8, u8, u8) = (205, 220, 57);

/// Format RGBA as a CSS color string.
pub fn rgba_css((r, g, b): (u8, u8, u8), a: f64) -> String {
    format!("rgba({r},{g},{b},{a})")
}
