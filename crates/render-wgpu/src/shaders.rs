/// Terrain chunks: one instanced quad per chunk, tiles fetched from a
/// `R8Uint` layer that includes a one-tile neighbour border. Land touching
/// water blends toward sand near the shared edge; water touching land
/// lightens into a shallow strip.
pub const TERRAIN_SHADER: &str = r#"
struct Camera {
    view_proj: mat3x3<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

@group(1) @binding(0)
var tiles: texture_2d_array<u32>;

@group(1) @binding(1)
var<uniform> palette: array<vec4<f32>, 16>;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) local: vec2<f32>,
    @location(1) @interpolate(flat) layer: u32,
};

const CHUNK_SIZE: f32 = 8.0;
const BEACH: u32 = 2u;
const EDGE: f32 = 0.25;

fn quad_corner(index: u32) -> vec2<f32> {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(1.0, 1.0),
    );
    return corners[index];
}

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) origin: vec2<f32>,
    @location(1) layer: u32,
) -> VertexOutput {
    let local = quad_corner(vertex_index) * CHUNK_SIZE;
    // tiles are centred on integer coordinates
    let world = origin - vec2<f32>(0.5, 0.5) + local;
    let clip = camera.view_proj * vec3<f32>(world, 1.0);

    var out: VertexOutput;
    out.clip_position = vec4<f32>(clip.xy, 0.99, 1.0);
    out.local = local;
    out.layer = layer;
    return out;
}

fn tile_at(cell: vec2<i32>, layer: u32) -> u32 {
    return textureLoad(tiles, cell + vec2<i32>(1, 1), i32(layer), 0).r;
}

fn is_water(tile: u32) -> bool {
    return tile <= 1u;
}

fn edge_weight(here: u32, there: u32, distance: f32) -> f32 {
    if (is_water(here) == is_water(there) || distance >= EDGE) {
        return 0.0;
    }
    return 1.0 - distance / EDGE;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let cell = vec2<i32>(floor(in.local));
    let f = fract(in.local);
    let here = tile_at(cell, in.layer);

    var weight = 0.0;
    weight = max(weight, edge_weight(here, tile_at(cell + vec2<i32>(-1, 0), in.layer), f.x));
    weight = max(weight, edge_weight(here, tile_at(cell + vec2<i32>(1, 0), in.layer), 1.0 - f.x));
    weight = max(weight, edge_weight(here, tile_at(cell + vec2<i32>(0, -1), in.layer), f.y));
    weight = max(weight, edge_weight(here, tile_at(cell + vec2<i32>(0, 1), in.layer), 1.0 - f.y));

    var color = palette[here].rgb;
    if (is_water(here)) {
        color = mix(color, min(color * 1.6, vec3<f32>(1.0)), weight * 0.5);
    } else {
        color = mix(color, palette[BEACH].rgb, weight);
    }
    return vec4<f32>(color, 1.0);
}
"#;

/// Atlas sprites anchored at their bottom centre. Depth follows screen
/// height so lower sprites cover higher ones across atlases.
pub const SPRITE_SHADER: &str = r#"
struct Camera {
    view_proj: mat3x3<f32>,
};

struct Sheet {
    grid: vec2<f32>,
    _pad: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

@group(1) @binding(0)
var sheet_texture: texture_2d<f32>;

@group(1) @binding(1)
var sheet_sampler: sampler;

@group(1) @binding(2)
var<uniform> sheet: Sheet;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

fn quad_corner(index: u32) -> vec2<f32> {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(1.0, 1.0),
    );
    return corners[index];
}

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position: vec2<f32>,
    @location(1) cell: vec4<f32>,
) -> VertexOutput {
    let corner = quad_corner(vertex_index);
    let size = cell.zw;
    let world = position + vec2<f32>((corner.x - 0.5) * size.x, corner.y * size.y);
    let clip = camera.view_proj * vec3<f32>(world, 1.0);
    let base = camera.view_proj * vec3<f32>(position, 1.0);

    var out: VertexOutput;
    out.clip_position = vec4<f32>(clip.xy, clamp(0.5 + 0.25 * base.y, 0.01, 0.98), 1.0);
    out.uv = vec2<f32>(
        (cell.x + corner.x * size.x) / sheet.grid.x,
        (cell.y + (1.0 - corner.y) * size.y) / sheet.grid.y,
    );
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(sheet_texture, sheet_sampler, in.uv);
    if (color.a < 0.5) {
        discard;
    }
    return color;
}
"#;

/// Cached label images drawn as world-space quads centred on the label.
pub const TEXT_SHADER: &str = r#"
struct Camera {
    view_proj: mat3x3<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

@group(1) @binding(0)
var label_texture: texture_2d<f32>;

@group(1) @binding(1)
var label_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

fn quad_corner(index: u32) -> vec2<f32> {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(0.0, 1.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(1.0, 1.0),
    );
    return corners[index];
}

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) center: vec2<f32>,
    @location(1) size: vec2<f32>,
) -> VertexOutput {
    let corner = quad_corner(vertex_index);
    let world = center + (corner - vec2<f32>(0.5, 0.5)) * size;
    let clip = camera.view_proj * vec3<f32>(world, 1.0);

    var out: VertexOutput;
    out.clip_position = vec4<f32>(clip.xy, 0.0, 1.0);
    out.uv = vec2<f32>(corner.x, 1.0 - corner.y);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(label_texture, label_sampler, in.uv);
}
"#;

/// Unfilled rectangles as five-vertex line strips.
pub const HITBOX_SHADER: &str = r#"
struct Camera {
    view_proj: mat3x3<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

fn outline_corner(index: u32) -> vec2<f32> {
    var corners = array<vec2<f32>, 5>(
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, -0.5),
        vec2<f32>(0.5, 0.5),
        vec2<f32>(-0.5, 0.5),
        vec2<f32>(-0.5, -0.5),
    );
    return corners[index];
}

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) center: vec2<f32>,
    @location(1) size: vec2<f32>,
) -> @builtin(position) vec4<f32> {
    let world = center + outline_corner(vertex_index) * size;
    let clip = camera.view_proj * vec3<f32>(world, 1.0);
    return vec4<f32>(clip.xy, 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 1.0, 0.2, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_shader_has_both_entry_points() {
        for src in [TERRAIN_SHADER, SPRITE_SHADER, TEXT_SHADER, HITBOX_SHADER] {
            assert!(src.contains("fn vs_main("));
            assert!(src.contains("fn fs_main("));
            assert!(src.contains("view_proj: mat3x3<f32>"));
        }
    }
}
