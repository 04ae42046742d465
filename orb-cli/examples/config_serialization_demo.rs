use image::ImageReader;
use orb_cli::{ExtractorConfig, OrbExtractor};
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let input = std::env::args().nth(1).unwrap_or_else(|| "lenna.png".to_string());
    let img = ImageReader::open(&input)?.decode()?.to_luma8();
    let (w, h) = img.dimensions();
    println!("Image {}: {}x{}", input, w, h);

    let configs = vec![
        ExtractorConfig::new().with_metadata("Default", "Balanced settings"),
        ExtractorConfig::dense_preset().with_metadata("Dense", "Many small cells, low thresholds"),
        ExtractorConfig::sparse_preset().with_metadata("Sparse", "Few levels, few strong corners"),
    ];

    // JSON and TOML files for every preset
    for config in &configs {
        let stem = config.name.as_deref().unwrap_or("config").to_lowercase();
        config.save_json(format!("{}_config.json", stem))?;
        config.save_toml(format!("{}_config.toml", stem))?;
        println!("Saved {}", config.summary());
    }

    let loaded = vec![
        ExtractorConfig::load_json("default_config.json")?,
        ExtractorConfig::load_toml("dense_config.toml")?,
        ExtractorConfig::load_json("sparse_config.json")?,
    ];

    println!("\n{:<10} {:>7} {:>9} {:>6} {:>10} {:>10}", "Name", "Levels", "Features", "Cell", "Keypoints", "Time");
    for config in &loaded {
        config.validate()?;
        let extractor = OrbExtractor::from_config(config)?;

        let start = Instant::now();
        let frame = extractor.extract(img.as_raw(), w as usize, h as usize)?;
        let elapsed = start.elapsed();

        println!(
            "{:<10} {:>7} {:>9} {:>6.0} {:>10} {:>10.2?}",
            config.name.as_deref().unwrap_or("-"),
            config.core.n_levels,
            config.core.n_features,
            config.core.cell_size,
            frame.num_features(),
            elapsed
        );
    }

    let original = ExtractorConfig::dense_preset().with_metadata("Round trip", "Serialization check");
    let from_json = ExtractorConfig::from_json(&original.to_json()?)?;
    let from_toml = ExtractorConfig::from_toml(&original.to_toml()?)?;
    assert_eq!(original.core, from_json.core);
    assert_eq!(original.core, from_toml.core);
    println!("\nJSON and TOML round trips preserve the configuration");

    Ok(())
}
