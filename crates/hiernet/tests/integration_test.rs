//! Integration tests for hiernet
//!
//! End-to-end checks across tensor, nn, serialize and vision: model shapes,
//! weight files, staged weight transfer and prediction decoding.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use hiernet::prelude::*;
use tempfile::TempDir;

fn cifar_batch(batch: usize) -> Tensor {
    randn(&[batch, 3, 32, 32])
}

/// Test 1: Output shapes for every factory at 32x32x3
#[test]
fn test_output_shapes_cifar10() {
    manual_seed(0);
    let x = cifar_batch(2);

    let expected: [(ModelKind, &[&[usize]]); 8] = [
        (ModelKind::CoarseUnet, &[&[2, 2]]),
        (ModelKind::MiddleUnet, &[&[2, 2], &[2, 5]]),
        (
            ModelKind::FineUnet,
            &[&[2, 2], &[2, 5], &[2, 10], &[2, 128], &[2, 64], &[2, 32]],
        ),
        (ModelKind::FineUnetSingle, &[&[2, 10]]),
        (ModelKind::CoarseBottleneck, &[&[2, 2]]),
        (ModelKind::MiddleBottleneck, &[&[2, 2], &[2, 5]]),
        (ModelKind::FineBottleneck, &[&[2, 2], &[2, 5], &[2, 10]]),
        (ModelKind::FineBottleneckSingle, &[&[2, 10]]),
    ];

    for (kind, shapes) in expected {
        let model = kind.build(InputShape::cifar10()).unwrap();
        let outputs = model.forward(&x).unwrap();
        assert_eq!(outputs.len(), shapes.len(), "{kind}");
        for (out, shape) in outputs.iter().zip(shapes) {
            assert_eq!(out.shape(), *shape, "{kind}");
        }
        assert_eq!(model.output_names(), kind.output_names().to_vec(), "{kind}");
    }
    println!("✓ all eight factories produce the expected output shapes");
}

/// Test 2: Eval-mode forward passes are deterministic
#[test]
fn test_eval_forward_is_deterministic() {
    manual_seed(7);
    let model = fine_unet(InputShape::new(16, 16, 3)).unwrap();
    assert!(!model.is_training());

    let x = randn(&[3, 3, 16, 16]);
    let a = model.forward(&x).unwrap();
    let b = model.forward(&x).unwrap();
    for (lhs, rhs) in a.iter().zip(&b) {
        assert_eq!(lhs.as_slice(), rhs.as_slice());
    }
    println!("✓ eval forward is deterministic");
}

/// Test 3: Weight files round-trip through every format
#[test]
fn test_weights_round_trip_all_formats() {
    let temp_dir = TempDir::new().unwrap();
    let shape = InputShape::new(8, 8, 3);
    let x = randn(&[2, 3, 8, 8]);

    manual_seed(1);
    let source = middle_bottleneck(shape).unwrap();
    let expected = source.forward(&x).unwrap();

    for file in ["w.json", "w.bin", "w.hnet", "w.safetensors"] {
        let path = temp_dir.path().join(file);
        save_model(&source, &path).unwrap();

        manual_seed(99);
        let target = middle_bottleneck(shape).unwrap();
        let report = load_model(&target, &path, true).unwrap();
        assert!(report.is_complete(), "{file}");

        let actual = target.forward(&x).unwrap();
        for (lhs, rhs) in actual.iter().zip(&expected) {
            assert!(lhs.allclose(rhs, 1e-6), "{file}");
        }
    }
    println!("✓ weights round-trip through json, bincode and safetensors");
}

/// Test 4: Coarse-stage weights seed the finer model through a file
#[test]
fn test_staged_transfer_through_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("coarse.safetensors");
    let shape = InputShape::new(16, 16, 3);

    manual_seed(3);
    let coarse = coarse_unet(shape).unwrap();
    save_model(&coarse, &path).unwrap();

    manual_seed(4);
    let fine = fine_unet(shape).unwrap();
    assert!(load_model(&fine, &path, true).is_err());

    let report = load_model(&fine, &path, false).unwrap();
    assert!(report.unexpected.is_empty());
    assert!(report.missing.iter().any(|k| k.starts_with("conv2d_8.")));
    assert!(report.loaded.contains(&"conv2d.weight".to_string()));

    // the coarse head sees identical trunk weights, so its output matches
    let x = randn(&[2, 3, 16, 16]);
    let from_coarse = coarse.forward(&x).unwrap();
    let from_fine = fine.forward(&x).unwrap();
    assert!(from_fine[0].allclose(&from_coarse[0], 1e-5));
    println!("✓ coarse weights transfer into fine_unet by name");
}

/// Test 5: A later-stage file loads strictly into an earlier-stage model
#[test]
fn test_strict_load_fine_into_coarse() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("fine.json");
    let shape = InputShape::new(8, 8, 3);

    manual_seed(21);
    let fine = fine_unet(shape).unwrap();
    save_model(&fine, &path).unwrap();

    manual_seed(22);
    let coarse = coarse_unet(shape).unwrap();
    let report = load_model(&coarse, &path, true).unwrap();
    assert!(report.missing.is_empty());
    assert!(!report.unexpected.is_empty());
    assert!(report.unexpected.iter().any(|k| k.starts_with("conv2d_8.")));
    assert_eq!(
        coarse.parameter("coarse.weight").unwrap().data().to_vec(),
        fine.parameter("coarse.weight").unwrap().data().to_vec()
    );
    println!("✓ strict load skips keys the smaller model lacks");
}

/// Test 6: Keras-layout input goes through an explicit conversion
#[test]
fn test_nhwc_input_and_decode() {
    manual_seed(5);
    let model = fine_bottleneck(InputShape::cifar10()).unwrap();

    let nhwc = randn(&[2, 32, 32, 3]);
    assert!(model.forward(&nhwc).is_err());

    let nchw = ops::nhwc_to_nchw(&nhwc).unwrap();
    let outputs = model.forward(&nchw).unwrap();

    let hierarchy = LabelHierarchy::cifar10();
    let preds = HierarchicalPrediction::decode(&model, &outputs, &hierarchy).unwrap();
    assert_eq!(preds.len(), 2);
    for pred in &preds {
        assert_eq!(pred.levels().count(), 3);
        let fine = pred.fine.as_ref().unwrap();
        assert!(fine.class < 10);
        assert!(fine.confidence > 0.0 && fine.confidence <= 1.0);
        let consistent = hierarchy.is_consistent(
            pred.coarse.as_ref().map(|p| p.class),
            pred.middle.as_ref().map(|p| p.class),
            Some(fine.class),
        );
        assert_eq!(pred.consistent, consistent);
    }
    println!("✓ NHWC input converts and decodes");
}

/// Test 7: Config builds a seeded, reproducible model
#[test]
fn test_model_config_from_toml() {
    let config = ModelConfig::from_toml_str(
        r#"
        kind = "coarse-bottleneck"
        input_shape = "8x8x3"
        seed = 11
        "#,
    )
    .unwrap();

    let a = config.build().unwrap();
    let b = config.build().unwrap();
    assert_eq!(a.name(), "coarse_bottleneck");
    assert_eq!(
        a.parameter("coarse.weight").unwrap().data().to_vec(),
        b.parameter("coarse.weight").unwrap().data().to_vec()
    );
    println!("✓ ModelConfig builds reproducibly");
}

/// Test 8: Parameter counts follow the Keras convention
#[test]
fn test_parameter_counts() {
    let model = coarse_unet(InputShape::cifar10()).unwrap();
    let conv = model.layer("conv2d_1").unwrap();
    assert_eq!(conv.num_parameters(), 9_248);

    // gamma/beta train, moving mean/variance are frozen
    let bn = model.layer("batch_normalization").unwrap();
    assert_eq!(bn.num_parameters(), 64);
    assert_eq!(bn.num_non_trainable(), 64);
    assert_eq!(model.num_non_trainable(), model.total_parameters() - model.num_parameters());
    println!("✓ parameter counts match");
}
