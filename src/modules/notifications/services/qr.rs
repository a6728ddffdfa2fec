use qrcode::render::svg;
use qrcode::QrCode;
use tracing::warn;

/// Render a QR code for the entry-pass URL as an inline SVG.
///
/// Rendering can fail for overly long input; callers fall back to the
/// plain URL so the confirmation email still goes out.
pub fn render_pass_qr(pass_url: &str) -> Option<String> {
    match QrCode::new(pass_url.as_bytes()) {
        Ok(code) => Some(
            code.render::<svg::Color>()
                .min_dimensions(240, 240)
                .build(),
        ),
        Err(e) => {
            warn!(url = %pass_url, error = %e, "QR rendering failed, using plain URL");
            None
        }
    }
}
