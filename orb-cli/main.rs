use image::{ImageReader, Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_circle_mut;
use log::info;
use orb_cli::{OrbConfig, OrbExtractor};
use std::error::Error;
use std::time::Instant;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let input = args.next().unwrap_or_else(|| "lenna.png".to_string());
    let output_path = args.next().unwrap_or_else(|| "keypoints.png".to_string());

    let img = ImageReader::open(&input)?.decode()?.to_luma8();
    let (w, h) = img.dimensions();
    info!("Loaded {} ({}x{})", input, w, h);

    let extractor = OrbExtractor::new(OrbConfig::default())?;

    let t0 = Instant::now();
    let frame = extractor.extract(img.as_raw(), w as usize, h as usize)?;
    let elapsed = t0.elapsed();

    info!("Frame {} extracted in {:.2?}", frame.id(), elapsed);
    info!("Keypoints per level: {:?}", frame.features_per_level());
    info!("Total: {} keypoints, {} descriptors", frame.num_features(), frame.descriptors().len());

    let mut output: RgbaImage = image::DynamicImage::ImageLuma8(img).into_rgba8();

    // radius grows with the level the keypoint came from
    for kp in frame.level_zero_keypoints() {
        let radius = 3 + 2 * kp.octave as i32;
        let (sin, cos) = kp.angle.to_radians().sin_cos();
        let (cx, cy) = (kp.x.round() as i32, kp.y.round() as i32);
        draw_hollow_circle_mut(&mut output, (cx, cy), radius, Rgba([255, 0, 0, 255]));
        imageproc::drawing::draw_line_segment_mut(
            &mut output,
            (kp.x, kp.y),
            (kp.x + cos * radius as f32, kp.y + sin * radius as f32),
            Rgba([0, 255, 0, 255]),
        );
    }

    output.save(&output_path)?;
    info!("Saved result image as {}", output_path);
    Ok(())
}
