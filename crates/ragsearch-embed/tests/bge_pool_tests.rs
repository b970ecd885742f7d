#![cfg(feature = "bge")]

use candle_core::{Device, Tensor};
use ragsearch_embed::mean_pool_normalized;

#[test]
fn pooling_ignores_padding_per_row() -> anyhow::Result<()> {
    let dev = Device::Cpu;
    // batch of 2, 3 positions, hidden 2
    let hidden = Tensor::from_vec(
        vec![
            3.0f32, 4.0, 100.0, 100.0, 100.0, 100.0, // row 0: only position 0 is real
            1.0, 0.0, 3.0, 0.0, 100.0, -100.0, // row 1: positions 0 and 1 are real
        ],
        (2, 3, 2),
        &dev,
    )?;
    let mask = Tensor::from_vec(vec![1u32, 0, 0, 1, 1, 0], (2, 3), &dev)?;
    let pooled: Vec<Vec<f32>> = mean_pool_normalized(&hidden, &mask)?.to_vec2()?;

    let expected = [[0.6f32, 0.8], [1.0, 0.0]];
    for (row, want) in pooled.iter().zip(expected) {
        for (a, b) in row.iter().zip(want) {
            assert!((a - b).abs() < 1e-5, "{row:?} vs {want:?}");
        }
    }
    Ok(())
}

#[test]
fn fully_masked_row_pools_to_zero() -> anyhow::Result<()> {
    let dev = Device::Cpu;
    let hidden = Tensor::from_vec(vec![5.0f32, 5.0, 5.0, 5.0], (1, 2, 2), &dev)?;
    let mask = Tensor::from_vec(vec![0u32, 0], (1, 2), &dev)?;
    let pooled: Vec<Vec<f32>> = mean_pool_normalized(&hidden, &mask)?.to_vec2()?;
    assert!(pooled[0].iter().all(|x| x.abs() < 1e-6));
    Ok(())
}
