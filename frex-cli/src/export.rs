//! PNG output with the render parameters embedded as tEXt chunks.

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use frex_render::{Image, RenderConfig};

/// Key/value pairs describing how `config` was rendered.
fn metadata_pairs(config: &RenderConfig, width: u32, height: u32) -> Vec<(String, String)> {
    let mut pairs = vec![
        ("Frex.Fractal".to_string(), config.fractal.to_string()),
        ("Frex.CenterX".to_string(), config.region.center.x.to_string()),
        ("Frex.CenterY".to_string(), config.region.center.y.to_string()),
        ("Frex.Radius".to_string(), config.region.radius.to_string()),
        ("Frex.IterMax".to_string(), config.iter_max.to_string()),
        ("Frex.BailOut".to_string(), config.bail_out.to_string()),
        ("Frex.ColorScheme".to_string(), config.color_scheme().to_string()),
        ("Frex.Resolution".to_string(), format!("{width}x{height}")),
    ];
    if config.julia_mode {
        pairs.push(("Frex.JuliaX".to_string(), config.julia.x.to_string()));
        pairs.push(("Frex.JuliaY".to_string(), config.julia.y.to_string()));
    }
    if config.decorated {
        pairs.push(("Frex.Distance".to_string(), config.distance.to_string()));
    }
    pairs
}

fn description(config: &RenderConfig) -> String {
    let mut desc = format!(
        "{} - Center: {} {}i, Radius: {}, Iterations: {}",
        config.fractal,
        config.region.center.x,
        config.region.center.y,
        config.region.radius,
        config.iter_max,
    );
    if config.julia_mode {
        desc.push_str(&format!(", Julia: {} {}i", config.julia.x, config.julia.y));
    }
    desc
}

/// Write `image` to `path` as an 8-bit RGBA PNG.
pub fn write_png(image: &Image, config: &RenderConfig, path: &Path) -> Result<(), Box<dyn Error>> {
    let (width, height) = (image.width(), image.height());
    let writer = BufWriter::new(File::create(path)?);

    let mut encoder = png::Encoder::new(writer, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.add_text_chunk("Software".to_string(), "Frex".to_string())?;
    encoder.add_text_chunk("Description".to_string(), description(config))?;
    for (key, value) in metadata_pairs(config, width, height) {
        encoder.add_text_chunk(key, value)?;
    }

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&image.to_rgba8())?;
    png_writer.finish()?;

    debug!(width, height, path = %path.display(), "Wrote PNG");
    Ok(())
}
