//! WGSL shader sources for the compiled GPU backend.
//! Used by the wgpu backend when the `wgpu` feature is enabled.

#![allow(dead_code)] // Shaders used by wgpu backend

use crate::Filter;

/// Bindings, local size overrides and pixel helpers shared by every filter.
///
/// Pixels are RGBA8 packed into one `u32` (R in the low byte). `store`
/// truncates like `fxlab_core::pixel::quantize`.
pub const PRELUDE: &str = r#"
@group(0) @binding(0) var<storage, read> src: array<u32>;
@group(0) @binding(1) var<storage, read_write> dst: array<u32>;
@group(0) @binding(2) var<uniform> dims: vec4<u32>;  // w, h, 0, 0

override WG_X: u32 = 8u;
override WG_Y: u32 = 8u;

fn load(x: i32, y: i32) -> vec4<f32> {
    let cx = clamp(x, 0, i32(dims.x) - 1);
    let cy = clamp(y, 0, i32(dims.y) - 1);
    return unpack4x8unorm(src[u32(cy) * dims.x + u32(cx)]);
}

fn store(x: u32, y: u32, v: vec4<f32>) {
    let q = vec4<u32>(clamp(v, vec4<f32>(0.0), vec4<f32>(1.0)) * 255.0);
    dst[y * dims.x + x] = q.x | (q.y << 8u) | (q.z << 16u) | (q.w << 24u);
}

fn gray(p: vec4<f32>) -> f32 {
    return dot(p.rgb, vec3<f32>(0.299, 0.587, 0.114));
}
"#;

pub const COPY: &str = r#"
@compute @workgroup_size(WG_X, WG_Y)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    if id.x >= dims.x || id.y >= dims.y { return; }
    dst[id.y * dims.x + id.x] = src[id.y * dims.x + id.x];
}
"#;

/// 5x5 box mean of RGB.
pub const BLUR: &str = r#"
@compute @workgroup_size(WG_X, WG_Y)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    if id.x >= dims.x || id.y >= dims.y { return; }
    let x = i32(id.x);
    let y = i32(id.y);

    var sum = vec3<f32>(0.0);
    for (var j = -2; j <= 2; j = j + 1) {
        for (var i = -2; i <= 2; i = i + 1) {
            sum = sum + load(x + i, y + j).rgb;
        }
    }
    store(id.x, id.y, vec4<f32>(sum / 25.0, load(x, y).a));
}
"#;

pub const SHARPEN: &str = r#"
@compute @workgroup_size(WG_X, WG_Y)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    if id.x >= dims.x || id.y >= dims.y { return; }
    let x = i32(id.x);
    let y = i32(id.y);
    let centre = load(x, y);

    var sum = vec3<f32>(0.0);
    for (var j = -1; j <= 1; j = j + 1) {
        for (var i = -1; i <= 1; i = i + 1) {
            let w = select(-1.0, 8.0, i == 0 && j == 0);
            sum = sum + load(x + i, y + j).rgb * w;
        }
    }
    store(id.x, id.y, vec4<f32>(sum / 8.0 + centre.rgb, centre.a));
}
"#;

/// Gradient magnitude over Rec.601 grey; alpha forced opaque.
pub const SOBEL: &str = r#"
@compute @workgroup_size(WG_X, WG_Y)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    if id.x >= dims.x || id.y >= dims.y { return; }
    let x = i32(id.x);
    let y = i32(id.y);

    let tl = gray(load(x - 1, y - 1));
    let tc = gray(load(x,     y - 1));
    let tr = gray(load(x + 1, y - 1));
    let ml = gray(load(x - 1, y));
    let mr = gray(load(x + 1, y));
    let bl = gray(load(x - 1, y + 1));
    let bc = gray(load(x,     y + 1));
    let br = gray(load(x + 1, y + 1));

    let gx = (tr + 2.0 * mr + br) - (tl + 2.0 * ml + bl);
    let gy = (bl + 2.0 * bc + br) - (tl + 2.0 * tc + tr);
    let g = sqrt(gx * gx + gy * gy);
    store(id.x, id.y, vec4<f32>(g, g, g, 1.0));
}
"#;

/// 5x5 bilateral, spatial sigma 3, range sigma 0.2.
pub const BILATERAL: &str = r#"
@compute @workgroup_size(WG_X, WG_Y)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    if id.x >= dims.x || id.y >= dims.y { return; }
    let x = i32(id.x);
    let y = i32(id.y);
    let centre = load(x, y);

    var coeff = 0.0;
    var sum = vec3<f32>(0.0);
    for (var j = -2; j <= 2; j = j + 1) {
        for (var i = -2; i <= 2; i = i + 1) {
            let p = load(x + i, y + j).rgb;
            let s = sqrt(f32(i * i + j * j)) / 3.0;
            let r = distance(p, centre.rgb) / 0.2;
            let w = exp(-0.5 * s * s) * exp(-0.5 * r * r);
            coeff = coeff + w;
            sum = sum + w * p;
        }
    }
    store(id.x, id.y, vec4<f32>(sum / coeff, centre.a));
}
"#;

/// Full WGSL module for `filter`.
pub fn source(filter: Filter) -> String {
    let body = match filter {
        Filter::Copy => COPY,
        Filter::Bilateral => BILATERAL,
        Filter::Blur => BLUR,
        Filter::Sharpen => SHARPEN,
        Filter::Sobel => SOBEL,
    };
    format!("{PRELUDE}{body}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_filter_has_an_entry_point() {
        for &filter in Filter::all() {
            let src = source(filter);
            assert!(src.contains("fn main("), "{filter}");
            assert!(src.contains("@workgroup_size(WG_X, WG_Y)"), "{filter}");
        }
    }
}
