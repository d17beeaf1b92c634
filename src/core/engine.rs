use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct ScanEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ScanEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        println!("Starting header scan...");

        println!("Parsing headers...");
        let entities = self.pipeline.extract().await?;
        println!("Parsed {} entities", entities.len());

        println!("Classifying entities...");
        let result = self.pipeline.transform(entities).await?;
        println!(
            "Classified {} entities ({} unclassified)",
            result.manifest.total_entities(),
            result.unclassified.len()
        );

        println!("Writing manifest...");
        let output_path = self.pipeline.load(result).await?;
        println!("Manifest saved to: {}", output_path);

        tracing::info!("Scan finished in {:.2?}", started.elapsed());
        Ok(output_path)
    }
}
