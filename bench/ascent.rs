#![recursion_limit = "256"]

use burn::prelude::*;
use burn_depth_adversarial::{
    AdversarialBackend, InferenceBackend,
    adversarial::{DepthLossOracle, LossGradientOracle, gradient_ascent},
    model::{DepthModelProvider, TinyDepthConfig, TinyDepthProvider},
};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

criterion_group! {
    name = ascent_benchmarks;
    config = Criterion::default().sample_size(20);
    targets = ascent_benchmark,
}
criterion_main!(ascent_benchmarks);

fn ascent_benchmark(c: &mut Criterion) {
    let device = <AdversarialBackend as Backend>::Device::default();
    let bench_device = device.clone();

    let config = TinyDepthConfig::new().with_height(64).with_width(64);
    let provider = TinyDepthProvider::<AdversarialBackend>::new(config.clone(), device.clone());
    let model = provider
        .initialize_model()
        .expect("tiny depth initializes without a checkpoint");

    let input = Tensor::<InferenceBackend, 4>::ones([1, config.height, config.width, 3], &device)
        .mul_scalar(0.5);
    let target = provider
        .predict(&model, Tensor::zeros([1, config.height, config.width, 3], &device), 2)
        .expect("prediction on a blank image");
    let final_layer = provider
        .get_final_layer(&model)
        .expect("tiny depth exposes its final layer");
    let oracle = DepthLossOracle::new(final_layer, target);

    let mut group = c.benchmark_group("burn_depth_adversarial");
    group.throughput(Throughput::Elements(1));
    group.bench_function("oracle_evaluate_64x64", |b| {
        b.iter(|| {
            let result = oracle.evaluate(input.clone()).expect("oracle evaluation");
            InferenceBackend::sync(&bench_device);
            black_box(result);
        });
    });
    group.bench_function("gradient_ascent_10_steps_64x64", |b| {
        b.iter(|| {
            let altered = gradient_ascent(input.clone(), &oracle, 10, 0.001).expect("ascent");
            InferenceBackend::sync(&bench_device);
            black_box(altered);
        });
    });
    group.finish();
}
