pub fn mean(values: &[u32]) -> Option<f64> {
    if values.is_empty() { return None; }

    let mut sum = 0.0;
    for v in values { sum += *v as f64 }
    Some(sum / values.len() as f64)
}

pub fn remap_value_clamped(val: f64, in_low: f64, in_high: f64, out_low: f64, out_high: f64) -> f64 {
    if in_high <= in_low { return out_high; }

    let clamped_val = val.clamp(in_low,in_high);

    let interpolated = (clamped_val - in_low ) / (in_high - in_low);
    let clamped = interpolated.clamp(0.0, 1.0);

    clamped * out_high + ( 1.0 - clamped ) * out_low
}
