//! Info command - describe a bigWig file

use anyhow::Result;
use gbx_core::bbi::{open_location, BigWigFile};

pub async fn execute(file: &str) -> Result<()> {
    let reader = open_location(file).await?;
    let bigwig = BigWigFile::open(reader)
        .await
        .map_err(|e| e.into_open_error(file))?;

    let header = bigwig.header();
    println!("File:        {}", bigwig.location());
    println!("Version:     {}", header.version);
    println!("Byte order:  {}", if header.big_endian { "big-endian" } else { "little-endian" });
    println!("Compressed:  {}", header.is_compressed());

    let summary = bigwig.summary();
    if summary.bases_covered > 0 {
        println!(
            "Summary:     {} bases covered, min {:.4}, max {:.4}, mean {:.4}",
            summary.bases_covered,
            summary.min_val,
            summary.max_val,
            summary.sum / summary.bases_covered as f64
        );
    }

    println!("Zoom levels: {}", bigwig.zoom_levels().len());
    for (index, zoom) in bigwig.zoom_levels().iter().enumerate() {
        println!("  [{}] {} bases per record", index, zoom.reduction_level);
    }

    println!("Chromosomes: {}", bigwig.chromosomes().len());
    for chrom in bigwig.chromosomes() {
        println!("  {}\t{}", chrom.name, chrom.length);
    }

    Ok(())
}
