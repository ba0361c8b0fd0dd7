//! Hierarchical Inference - build, checkpoint and run a bottleneck model
//!
//! Run with: `cargo run -p hiernet --example hierarchical_inference`
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use hiernet::prelude::*;

fn main() -> Result<()> {
    manual_seed(42);

    // Stage 1: coarse model, checkpointed
    let shape = InputShape::cifar10();
    let coarse = coarse_bottleneck(shape)?;
    print!("{}", coarse.summary(1));

    let dir = std::env::temp_dir().join("hiernet-demo");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("coarse.safetensors");
    save_model(&coarse, &path)?;

    // Stage 2: the fine model picks up the coarse weights by name
    let fine = fine_bottleneck(shape)?;
    let report = load_model(&fine, &path, false)?;
    println!(
        "loaded {} tensors, {} left at initialization",
        report.loaded.len(),
        report.missing.len()
    );

    let x = randn(&[4, 3, 32, 32]);
    let outputs = fine.forward(&x)?;
    let hierarchy = LabelHierarchy::cifar10();
    for (i, pred) in HierarchicalPrediction::decode(&fine, &outputs, &hierarchy)?
        .iter()
        .enumerate()
    {
        println!("#{i} {pred}");
    }
    Ok(())
}
