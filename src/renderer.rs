use crate::camera::PerspectiveCamera;
use crate::error::ViewerError;
use crate::geometry::Geometry;
use crate::scene::{Environment, Scene};
use glow::{Context, HasContext as _};
use nalgebra::{Matrix3, Matrix4, Vector3};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

const MESH_VS: &str = r#"#version 300 es
    precision highp float;
    uniform mat4 u_view_proj;
    uniform mat4 u_model;
    uniform mat3 u_normal;
    layout(location = 0) in vec3 a_pos;
    layout(location = 1) in vec3 a_normal;
    out vec3 v_world;
    out vec3 v_normal;
    void main() {
        vec4 world = u_model * vec4(a_pos, 1.0);
        v_world     = world.xyz;
        v_normal    = u_normal * a_normal;
        gl_Position = u_view_proj * world;
    }"#;

const MESH_FS: &str = r#"#version 300 es
    precision mediump float;
    uniform vec3  u_color;
    uniform float u_metalness;
    uniform float u_roughness;
    uniform vec3  u_camera;
    uniform vec3  u_ambient;
    uniform vec3  u_light_pos;
    uniform vec3  u_light_color;
    uniform vec3  u_zenith;
    uniform vec3  u_horizon;
    uniform vec3  u_ground;
    in  vec3 v_world;
    in  vec3 v_normal;
    out vec4 o_col;
    vec3 sky(vec3 d) {
        return d.y >= 0.0 ? mix(u_horizon, u_zenith, pow(d.y, 0.6))
                          : mix(u_horizon, u_ground, pow(-d.y, 0.4));
    }
    void main() {
        vec3 n = normalize(v_normal);
        if (!gl_FrontFacing) n = -n;
        vec3 v = normalize(u_camera - v_world);
        vec3 l = normalize(u_light_pos - v_world);
        vec3 h = normalize(l + v);
        float diff  = max(dot(n, l), 0.0);
        float spec  = pow(max(dot(n, h), 0.0), mix(256.0, 4.0, u_roughness));
        vec3 diffuse  = u_color * (u_ambient + u_light_color * diff) * (1.0 - u_metalness);
        vec3 env      = sky(reflect(-v, n)) * u_color * u_metalness;
        vec3 specular = u_light_color * spec * mix(vec3(0.04), u_color, u_metalness);
        o_col = vec4(diffuse + env + specular, 1.0);
    }"#;

// Full-screen triangle; the ray through each pixel picks the sky color.
const SKY_VS: &str = r#"#version 300 es
    precision highp float;
    uniform mat4 u_inv_view_proj;
    out vec3 v_dir;
    void main() {
        vec2 p = vec2(float((gl_VertexID << 1) & 2), float(gl_VertexID & 2)) * 2.0 - 1.0;
        vec4 far  = u_inv_view_proj * vec4(p, 1.0, 1.0);
        vec4 near = u_inv_view_proj * vec4(p, -1.0, 1.0);
        v_dir = far.xyz / far.w - near.xyz / near.w;
        gl_Position = vec4(p, 0.0, 1.0);
    }"#;

const SKY_FS: &str = r#"#version 300 es
    precision mediump float;
    uniform vec3 u_zenith;
    uniform vec3 u_horizon;
    uniform vec3 u_ground;
    in  vec3 v_dir;
    out vec4 o_col;
    void main() {
        vec3 d = normalize(v_dir);
        vec3 c = d.y >= 0.0 ? mix(u_horizon, u_zenith, pow(d.y, 0.6))
                            : mix(u_horizon, u_ground, pow(-d.y, 0.4));
        o_col = vec4(c, 1.0);
    }"#;

/// Per-frame values shared by every draw.
#[derive(Debug, Clone, Copy)]
pub struct FrameUniforms {
    pub view_proj: Matrix4<f32>,
    pub inv_view_proj: Matrix4<f32>,
    pub camera: Vector3<f32>,
    pub ambient: [f32; 3],
    pub light_pos: Vector3<f32>,
    pub light_color: [f32; 3],
    pub environment: Option<Environment>,
}

impl FrameUniforms {
    pub fn new(scene: &Scene, camera: &PerspectiveCamera) -> Self {
        let view_proj = camera.view_projection();
        let (ambient, light_pos, light_color) = {
            let ambient = scene.ambient_light().map_or([0.0; 3], |a| scale(a.color, a.intensity));
            match scene.point_light() {
                Some(p) => (ambient, p.position, scale(p.color, p.intensity)),
                None => (ambient, Vector3::zeros(), [0.0; 3]),
            }
        };
        Self {
            view_proj,
            inv_view_proj: view_proj.try_inverse().unwrap_or_else(Matrix4::identity),
            camera: camera.position.coords,
            ambient,
            light_pos,
            light_color,
            environment: scene.environment,
        }
    }
}

fn scale(c: [f32; 3], k: f32) -> [f32; 3] {
    [c[0] * k, c[1] * k, c[2] * k]
}

/// One indexed mesh draw.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall {
    vao: glow::VertexArray,
    index_count: i32,
    model: Matrix4<f32>,
    normal: Matrix3<f32>,
    color: [f32; 3],
    metalness: f32,
    roughness: f32,
}

/// Buffers of one uploaded geometry.
#[derive(Debug)]
pub struct GpuMesh {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ebo: glow::Buffer,
    index_count: i32,
}

impl GpuMesh {
    /// Interleaves positions and normals (6 floats per vertex) and uploads them.
    pub unsafe fn upload(gl: &Context, geometry: &Geometry) -> Result<Self, String> {
        let mut verts = Vec::with_capacity(geometry.positions().len() * 6);
        for (p, n) in geometry.positions().iter().zip(geometry.normals()) {
            verts.extend_from_slice(p);
            verts.extend_from_slice(n);
        }

        let vao = gl.create_vertex_array()?;
        let vbo = gl.create_buffer()?;
        let ebo = gl.create_buffer()?;

        gl.bind_vertex_array(Some(vao));
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytemuck::cast_slice(&verts), glow::STATIC_DRAW);
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, 24, 0);
        gl.enable_vertex_attrib_array(1);
        gl.vertex_attrib_pointer_f32(1, 3, glow::FLOAT, false, 24, 12);

        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
        gl.buffer_data_u8_slice(
            glow::ELEMENT_ARRAY_BUFFER,
            bytemuck::cast_slice(geometry.indices()),
            glow::STATIC_DRAW,
        );
        gl.bind_vertex_array(None);

        Ok(Self { vao, vbo, ebo, index_count: geometry.indices().len() as i32 })
    }

    pub unsafe fn destroy(self, gl: &Context) {
        gl.delete_vertex_array(self.vao);
        gl.delete_buffer(self.vbo);
        gl.delete_buffer(self.ebo);
    }
}

/// Linked shader programs plus the empty VAO the sky pass draws with.
pub struct MeshProgram {
    mesh: glow::Program,
    sky: glow::Program,
    sky_vao: glow::VertexArray,
    u: HashMap<&'static str, glow::UniformLocation>,
    u_sky: HashMap<&'static str, glow::UniformLocation>,
}

unsafe impl Send for MeshProgram {}
unsafe impl Sync for MeshProgram {}

const MESH_UNIFORMS: [&str; 13] = [
    "u_view_proj", "u_model", "u_normal", "u_color", "u_metalness", "u_roughness", "u_camera",
    "u_ambient", "u_light_pos", "u_light_color", "u_zenith", "u_horizon", "u_ground",
];
const SKY_UNIFORMS: [&str; 4] = ["u_inv_view_proj", "u_zenith", "u_horizon", "u_ground"];

impl MeshProgram {
    pub unsafe fn new(gl: &Context) -> Result<Self, String> {
        let mesh = link(gl, MESH_VS, MESH_FS)?;
        let sky = link(gl, SKY_VS, SKY_FS)?;
        let sky_vao = gl.create_vertex_array()?;

        let lookup = |program, names: &[&'static str]| {
            names
                .iter()
                .filter_map(|&name| gl.get_uniform_location(program, name).map(|loc| (name, loc)))
                .collect::<HashMap<_, _>>()
        };
        let u = lookup(mesh, &MESH_UNIFORMS);
        let u_sky = lookup(sky, &SKY_UNIFORMS);

        Ok(Self { mesh, sky, sky_vao, u, u_sky })
    }

    /// Draws the sky, then every mesh with depth testing. Leaves depth testing off.
    pub unsafe fn paint(&self, gl: &Context, frame: &FrameUniforms, draws: &[DrawCall]) {
        gl.disable(glow::CULL_FACE);
        gl.disable(glow::BLEND);

        if let Some(env) = &frame.environment {
            gl.disable(glow::DEPTH_TEST);
            gl.use_program(Some(self.sky));
            gl.uniform_matrix_4_f32_slice(self.u_sky.get("u_inv_view_proj"), false, frame.inv_view_proj.as_slice());
            set_environment(gl, &self.u_sky, env);
            gl.bind_vertex_array(Some(self.sky_vao));
            gl.draw_arrays(glow::TRIANGLES, 0, 3);
        }

        gl.enable(glow::DEPTH_TEST);
        gl.depth_func(glow::LEQUAL);
        gl.depth_mask(true);
        gl.clear(glow::DEPTH_BUFFER_BIT);

        gl.use_program(Some(self.mesh));
        let u = &self.u;
        gl.uniform_matrix_4_f32_slice(u.get("u_view_proj"), false, frame.view_proj.as_slice());
        gl.uniform_3_f32(u.get("u_camera"), frame.camera.x, frame.camera.y, frame.camera.z);
        gl.uniform_3_f32_slice(u.get("u_ambient"), &frame.ambient);
        gl.uniform_3_f32(u.get("u_light_pos"), frame.light_pos.x, frame.light_pos.y, frame.light_pos.z);
        gl.uniform_3_f32_slice(u.get("u_light_color"), &frame.light_color);
        if let Some(env) = &frame.environment {
            set_environment(gl, u, env);
        }

        for draw in draws {
            gl.uniform_matrix_4_f32_slice(u.get("u_model"), false, draw.model.as_slice());
            gl.uniform_matrix_3_f32_slice(u.get("u_normal"), false, draw.normal.as_slice());
            gl.uniform_3_f32_slice(u.get("u_color"), &draw.color);
            gl.uniform_1_f32(u.get("u_metalness"), draw.metalness);
            gl.uniform_1_f32(u.get("u_roughness"), draw.roughness);
            gl.bind_vertex_array(Some(draw.vao));
            gl.draw_elements(glow::TRIANGLES, draw.index_count, glow::UNSIGNED_INT, 0);
        }

        gl.bind_vertex_array(None);
        gl.disable(glow::DEPTH_TEST);
    }

    pub unsafe fn destroy(&self, gl: &Context) {
        gl.delete_program(self.mesh);
        gl.delete_program(self.sky);
        gl.delete_vertex_array(self.sky_vao);
    }
}

unsafe fn set_environment(gl: &Context, u: &HashMap<&'static str, glow::UniformLocation>, env: &Environment) {
    gl.uniform_3_f32_slice(u.get("u_zenith"), &env.zenith);
    gl.uniform_3_f32_slice(u.get("u_horizon"), &env.horizon);
    gl.uniform_3_f32_slice(u.get("u_ground"), &env.ground);
}

unsafe fn compile(gl: &Context, kind: u32, src: &str) -> Result<glow::Shader, String> {
    let shader = gl.create_shader(kind)?;
    gl.shader_source(shader, src);
    gl.compile_shader(shader);
    if !gl.get_shader_compile_status(shader) {
        let info = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        return Err(info);
    }
    Ok(shader)
}

unsafe fn link(gl: &Context, vs_src: &str, fs_src: &str) -> Result<glow::Program, String> {
    let vs = compile(gl, glow::VERTEX_SHADER, vs_src)?;
    let fs = compile(gl, glow::FRAGMENT_SHADER, fs_src)?;
    let prog = gl.create_program()?;
    gl.attach_shader(prog, vs);
    gl.attach_shader(prog, fs);
    gl.link_program(prog);
    gl.delete_shader(vs);
    gl.delete_shader(fs);
    if !gl.get_program_link_status(prog) {
        let info = gl.get_program_info_log(prog);
        gl.delete_program(prog);
        return Err(info);
    }
    Ok(prog)
}

/// GPU side of the scene: programs plus a buffer cache keyed by geometry id.
pub struct GpuScene {
    gl: Arc<Context>,
    program: Arc<MeshProgram>,
    meshes: HashMap<Uuid, GpuMesh>,
}

impl GpuScene {
    pub fn new(gl: Arc<Context>) -> Result<Self, ViewerError> {
        let program = unsafe { MeshProgram::new(&gl) }.map_err(ViewerError::Js)?;
        Ok(Self { gl, program: Arc::new(program), meshes: HashMap::new() })
    }

    pub fn program(&self) -> Arc<MeshProgram> {
        Arc::clone(&self.program)
    }

    pub fn cached(&self) -> usize {
        self.meshes.len()
    }

    /// Uploads whatever visible geometry is not on the GPU yet and returns
    /// the draw list for this frame.
    pub fn prepare(&mut self, scene: &Scene) -> Vec<DrawCall> {
        let mut draws = Vec::new();
        let gl = &self.gl;
        let meshes = &mut self.meshes;

        scene.visible_meshes(|node, world| {
            let Some(material) = scene.material(node.material) else { return };
            let id = node.geometry.id();
            if !meshes.contains_key(&id) {
                match unsafe { GpuMesh::upload(gl, &node.geometry) } {
                    Ok(mesh) => {
                        meshes.insert(id, mesh);
                    }
                    Err(e) => {
                        log::error!("upload of geometry {id} failed: {e}");
                        return;
                    }
                }
            }
            let Some(mesh) = meshes.get(&id) else { return };

            let linear: Matrix3<f32> = world.fixed_view::<3, 3>(0, 0).into_owned();
            draws.push(DrawCall {
                vao: mesh.vao,
                index_count: mesh.index_count,
                model: world,
                normal: linear.try_inverse().map(|m| m.transpose()).unwrap_or(linear),
                color: material.color,
                metalness: material.metalness,
                roughness: material.roughness,
            });
        });

        draws
    }

    /// Frees one geometry's buffers. Returns false if it was never uploaded.
    pub fn release(&mut self, id: Uuid) -> bool {
        match self.meshes.remove(&id) {
            Some(mesh) => {
                unsafe { mesh.destroy(&self.gl) };
                true
            }
            None => false,
        }
    }

    /// Frees every buffer and both programs.
    pub fn destroy(&mut self) {
        for (_, mesh) in self.meshes.drain() {
            unsafe { mesh.destroy(&self.gl) };
        }
        unsafe { self.program.destroy(&self.gl) };
    }
}
