//! URL-transformation directive chains.
//!
//! Renders compiled operations as the `/`-separated chain a
//! URL-transformation provider reads: one component per operation, each a
//! comma-separated list of `key_value` parameters, bottom layer first.
//!
//! Geometry stays relative (`fl_relative`). Font sizes and stroke widths are
//! compiled as fractions of frame height but the provider reads them as
//! pixels, so they are scaled by the output height.

use clipforge_media_model::geometry::Resolution;
use clipforge_media_model::operation::{ActivationWindow, OperationPayload, TransformOperation};
use clipforge_media_model::overlay::{BlendMode, TextAlignment};
use clipforge_media_model::reference::is_remote_url;

/// Encode `operations` in order for an output of `resolution`.
/// Empty input encodes to an empty string.
pub fn encode_directives(operations: &[TransformOperation], resolution: Resolution) -> String {
    operations
        .iter()
        .map(|op| encode_operation(op, resolution.height))
        .collect::<Vec<_>>()
        .join("/")
}

fn encode_operation(op: &TransformOperation, height: u32) -> String {
    let mut params: Vec<String> = Vec::new();

    match &op.payload {
        OperationPayload::Text(run) => {
            let mut style = format!(
                "{}_{}",
                escape(&run.font_family),
                pixels(run.font_size, height).max(1)
            );
            if run.bold {
                style.push_str("_bold");
            }
            if run.italic {
                style.push_str("_italic");
            }
            match run.alignment {
                TextAlignment::Left => {}
                TextAlignment::Center => style.push_str("_center"),
                TextAlignment::Right => style.push_str("_right"),
            }
            params.push(format!("l_text:{style}:{}", escape(&run.text)));
            params.push(format!("co_rgb:{}", escape(&run.color)));
        }
        OperationPayload::Image(image) => {
            params.push(format!("l_{}", layer_id(&image.reference)));
        }
        OperationPayload::Shape(shape) => {
            params.push(format!("l_shape:{}", shape.shape.as_str()));
            params.push(format!("co_rgb:{}", escape(&shape.fill)));
            if let Some(stroke) = &shape.stroke {
                params.push(format!(
                    "bo_{}_solid_rgb:{}",
                    pixels(stroke.width, height),
                    escape(&stroke.color)
                ));
            }
        }
    }

    params.push("fl_relative".to_string());
    params.push(format!("w_{}", number(op.geometry.w)));
    params.push(format!("h_{}", number(op.geometry.h)));
    params.push("g_north_west".to_string());
    params.push(format!("x_{}", number(op.geometry.x)));
    params.push(format!("y_{}", number(op.geometry.y)));

    if op.rotation_deg != 0.0 {
        params.push(format!("a_{}", number(op.rotation_deg)));
    }

    let percent = (op.opacity * 100.0).round().clamp(0.0, 100.0) as u32;
    if percent < 100 {
        params.push(format!("o_{percent}"));
    }

    if op.blend_mode != BlendMode::Normal {
        params.push(format!("e_{}", op.blend_mode.as_str().replace('-', "_")));
    }

    if let ActivationWindow::Span {
        start_secs,
        duration_secs,
        fade_in_secs,
        fade_out_secs,
    } = op.window
    {
        params.push(format!("so_{}", number(start_secs)));
        params.push(format!("du_{}", number(duration_secs)));
        if fade_in_secs > 0.0 {
            params.push(format!("e_fade:{}", (fade_in_secs * 1000.0).round() as i64));
        }
        if fade_out_secs > 0.0 {
            params.push(format!("e_fade:-{}", (fade_out_secs * 1000.0).round() as i64));
        }
    }

    params.push("fl_layer_apply".to_string());
    params.join(",")
}

/// Fixed four-decimal rendering with trailing zeros trimmed.
fn number(value: f64) -> String {
    let rendered = format!("{value:.4}");
    let trimmed = rendered.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Height fraction to whole pixels.
fn pixels(fraction: f64, height: u32) -> u32 {
    let px = (fraction * f64::from(height)).round();
    if px.is_finite() && px > 0.0 {
        px as u32
    } else {
        0
    }
}

/// Remote URLs become fetch layers; provider ids use `:` where paths use `/`.
fn layer_id(reference: &str) -> String {
    if is_remote_url(reference) {
        format!("fetch:{}", base64_url(reference.trim().as_bytes()))
    } else {
        escape(&reference.replace('/', ":"))
    }
}

/// Unpadded URL-safe base64.
fn base64_url(data: &[u8]) -> String {
    const ALPHABET: &[u8; 64] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

    let mut out = String::with_capacity((data.len() * 4).div_ceil(3));
    for chunk in data.chunks(3) {
        let b = [
            chunk[0],
            chunk.get(1).copied().unwrap_or(0),
            chunk.get(2).copied().unwrap_or(0),
        ];
        let n = (u32::from(b[0]) << 16) | (u32::from(b[1]) << 8) | u32::from(b[2]);
        let emit = chunk.len() + 1;
        for i in 0..emit {
            let index = (n >> (18 - 6 * i)) & 0x3f;
            out.push(ALPHABET[index as usize] as char);
        }
    }
    out
}

/// Percent-encode everything outside `[A-Za-z0-9._:-]`.
fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b':' | b'-' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use clipforge_media_model::geometry::NormalizedRect;
    use clipforge_media_model::operation::{ImageRef, ShapeDescriptor, Stroke, TextRun};
    use clipforge_media_model::overlay::{ImageFit, ShapeKind};

    use super::*;

    fn op(sequence: usize, payload: OperationPayload) -> TransformOperation {
        TransformOperation {
            sequence,
            overlay_id: format!("o{sequence}"),
            geometry: NormalizedRect {
                x: 0.1,
                y: 0.2,
                w: 0.5,
                h: 0.25,
            },
            rotation_deg: 0.0,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            window: ActivationWindow::Always,
            payload,
        }
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(number(0.5), "0.5");
        assert_eq!(number(2.0), "2");
        assert_eq!(number(0.33333), "0.3333");
        assert_eq!(number(-0.00001), "0");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("Hello, World/2"), "Hello%2C%20World%2F2");
    }

    const FULL_HD: Resolution = Resolution {
        width: 1920,
        height: 1080,
    };

    fn image(reference: &str) -> TransformOperation {
        op(
            0,
            OperationPayload::Image(ImageRef {
                reference: reference.to_string(),
                fit: ImageFit::Contain,
            }),
        )
    }

    #[test]
    fn test_base64_url() {
        assert_eq!(base64_url(b""), "");
        assert_eq!(base64_url(b"f"), "Zg");
        assert_eq!(base64_url(b"fo"), "Zm8");
        assert_eq!(base64_url(b"foo"), "Zm9v");
        assert_eq!(base64_url(&[0xfb, 0xff]), "-_8");
    }

    #[test]
    fn test_remote_image_uses_fetch_layer() {
        let encoded = encode_directives(&[image("https://cdn.example.com/logo.png")], FULL_HD);
        assert!(encoded.starts_with(&format!(
            "l_fetch:{},",
            base64_url(b"https://cdn.example.com/logo.png")
        )));
        assert!(!encoded.contains("https:::"));
    }

    #[test]
    fn test_image_layer_chain() {
        let encoded = encode_directives(&[image("overlays/logo_v2")], FULL_HD);
        assert_eq!(
            encoded,
            "l_overlays:logo_v2,fl_relative,w_0.5,h_0.25,g_north_west,x_0.1,y_0.2,fl_layer_apply"
        );
    }

    #[test]
    fn test_chain_preserves_order_and_options() {
        let mut text = op(
            1,
            OperationPayload::Text(TextRun {
                text: "Hi there".to_string(),
                font_family: "Inter".to_string(),
                font_size: 0.05,
                color: "ffffff".to_string(),
                alignment: TextAlignment::Center,
                bold: true,
                italic: false,
            }),
        );
        text.opacity = 0.5;
        text.blend_mode = BlendMode::ColorDodge;
        text.window = ActivationWindow::Span {
            start_secs: 1.5,
            duration_secs: 3.0,
            fade_in_secs: 0.25,
            fade_out_secs: 0.0,
        };
        let shape = op(
            0,
            OperationPayload::Shape(ShapeDescriptor {
                shape: ShapeKind::Circle,
                fill: "ff0000".to_string(),
                stroke: Some(Stroke {
                    color: "00ff00".to_string(),
                    width: 0.01,
                }),
            }),
        );

        let encoded = encode_directives(&[shape, text], FULL_HD);
        let components: Vec<&str> = encoded.split('/').collect();
        assert_eq!(components.len(), 2);
        assert!(components[0].starts_with("l_shape:circle,co_rgb:ff0000,bo_11_solid_rgb:00ff00,"));
        assert!(components[1].starts_with("l_text:Inter_54_bold_center:Hi%20there,co_rgb:ffffff,"));
        assert!(components[1].contains(",o_50,e_color_dodge,so_1.5,du_3,e_fade:250,"));
        assert!(components[1].ends_with(",fl_layer_apply"));
    }

    #[test]
    fn test_empty_chain() {
        assert_eq!(encode_directives(&[], FULL_HD), "");
    }
}
