// Every scene shader starts with this block; `FrameUniforms` in gpu.rs
// mirrors it field for field.
const FRAME_UNIFORMS: &str = r#"
struct Frame {
    view_proj: mat4x4<f32>,
    // xyz: camera position, w: distance where fog is complete
    eye: vec4<f32>,
    // xy: avatar ground position (x, z), z: shadow radius, w: seconds
    avatar: vec4<f32>,
    sky: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;

fn apply_fog(color: vec3<f32>, world: vec3<f32>) -> vec3<f32> {
    let d = distance(world, frame.eye.xyz);
    let f = smoothstep(frame.eye.w * 0.4, frame.eye.w, d);
    return mix(color, frame.sky.rgb, f);
}
"#;

/// Instanced avatar blocks: key light plus sky fill, loading blocks pulse.
pub fn block_shader() -> String {
    [FRAME_UNIFORMS, BLOCK_BODY].concat()
}

/// Ground plane with procedural grid lines and the avatar's blob shadow.
pub fn ground_shader() -> String {
    [FRAME_UNIFORMS, GROUND_BODY].concat()
}

const BLOCK_BODY: &str = r#"
struct Block {
    @location(2) m0: vec4<f32>,
    @location(3) m1: vec4<f32>,
    @location(4) m2: vec4<f32>,
    @location(5) m3: vec4<f32>,
    @location(6) albedo: vec4<f32>,
    @location(7) role: u32,
};

struct Shaded {
    @builtin(position) clip: vec4<f32>,
    @location(0) world: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) albedo: vec3<f32>,
    @location(3) glow: f32,
};

const ROLE_LOADING: u32 = 4u;

@vertex
fn vs_block(
    @location(0) corner: vec3<f32>,
    @location(1) normal: vec3<f32>,
    block: Block,
) -> Shaded {
    let model = mat4x4<f32>(block.m0, block.m1, block.m2, block.m3);
    let world = model * vec4<f32>(corner, 1.0);

    var out: Shaded;
    out.clip = frame.view_proj * world;
    out.world = world.xyz;
    out.normal = normalize((model * vec4<f32>(normal, 0.0)).xyz);
    out.albedo = block.albedo.rgb;
    out.glow = 0.0;
    if block.role == ROLE_LOADING {
        out.glow = 0.5 + 0.5 * sin(frame.avatar.w * 4.0);
    }
    return out;
}

@fragment
fn fs_block(in: Shaded) -> @location(0) vec4<f32> {
    let key = normalize(vec3<f32>(0.4, 1.0, 0.6));
    let fill = mix(0.25, 0.45, in.normal.y * 0.5 + 0.5);
    let lit = in.albedo * (fill + max(dot(in.normal, key), 0.0) * 0.65);
    let color = mix(lit, vec3<f32>(0.95, 0.95, 1.0), in.glow * 0.35);
    return vec4<f32>(apply_fog(color, in.world), 1.0);
}
"#;

const GROUND_BODY: &str = r#"
struct Ground {
    @builtin(position) clip: vec4<f32>,
    @location(0) world: vec3<f32>,
};

@vertex
fn vs_ground(@location(0) position: vec3<f32>) -> Ground {
    var out: Ground;
    out.clip = frame.view_proj * vec4<f32>(position, 1.0);
    out.world = position;
    return out;
}

// 1 on a line of the given spacing, fading to 0 within a pixel of it.
fn grid_line(p: vec2<f32>, spacing: f32) -> f32 {
    let cell = p / spacing;
    let dist = abs(fract(cell - 0.5) - 0.5) / fwidth(cell);
    return 1.0 - min(min(dist.x, dist.y), 1.0);
}

@fragment
fn fs_ground(in: Ground) -> @location(0) vec4<f32> {
    let p = in.world.xz;
    var color = vec3<f32>(0.2, 0.23, 0.2);
    color = mix(color, vec3<f32>(0.28, 0.3, 0.28), grid_line(p, 1.0));
    color = mix(color, vec3<f32>(0.45, 0.5, 0.45), grid_line(p, 5.0));

    let to_avatar = distance(p, frame.avatar.xy);
    let shadow = 1.0 - smoothstep(0.0, frame.avatar.z, to_avatar);
    color = color * (1.0 - 0.45 * shadow);
    return vec4<f32>(apply_fog(color, in.world), 1.0);
}
"#;

/// Stretches the scaled scene target over the whole surface.
pub const UPSCALE_SHADER: &str = r#"
@group(0) @binding(0) var scene_color: texture_2d<f32>;
@group(0) @binding(1) var scene_sampler: sampler;

struct Fullscreen {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

// One oversized triangle covers the viewport.
@vertex
fn vs_upscale(@builtin(vertex_index) i: u32) -> Fullscreen {
    let uv = vec2<f32>(f32((i << 1u) & 2u), f32(i & 2u));
    var out: Fullscreen;
    out.clip = vec4<f32>(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, 0.0, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_upscale(in: Fullscreen) -> @location(0) vec4<f32> {
    return textureSample(scene_color, scene_sampler, in.uv);
}
"#;
