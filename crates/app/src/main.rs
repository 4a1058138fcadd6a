//! Entry point for Lumen3D.
//! Logging, CLI flags, mesh loading; everything else lives in `platform`.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Mesh shown when no `--mesh` is given.
const DEFAULT_MESH: &str = include_str!("../assets/cube.obj");

fn parse_backend_arg(args: &[String]) -> wgpu::Backends {
    // Accept: --gpu-backend=auto|vulkan|dx12|metal|gl
    let mut backends = wgpu::Backends::all(); // default = auto
    for arg in args {
        if let Some(val) = arg.strip_prefix("--gpu-backend=") {
            backends = match val.to_ascii_lowercase().as_str() {
                "auto" => wgpu::Backends::all(),
                "vulkan" | "vk" => wgpu::Backends::VULKAN,
                "dx12" | "d3d12" => wgpu::Backends::DX12,
                "metal" | "mtl" => wgpu::Backends::METAL,
                "gl" | "opengl" | "gles" => wgpu::Backends::GL,
                other => {
                    log::warn!("Unknown backend '{}', falling back to auto.", other);
                    wgpu::Backends::all()
                }
            };
        }
    }
    backends
}

fn parse_show_fps_arg(args: &[String]) -> bool {
    // --show-fps[=on|off], off by default
    for arg in args {
        if arg == "--show-fps" {
            return true;
        }
        if let Some(val) = arg.strip_prefix("--show-fps=") {
            return matches!(
                val.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            );
        }
    }
    false
}

fn parse_size_args(args: &[String]) -> (u32, u32) {
    let mut w: Option<u32> = None;
    let mut h: Option<u32> = None;

    for arg in args {
        if let Some(v) = arg.strip_prefix("--size=") {
            if let Some((sw, sh)) = v.split_once('x').or_else(|| v.split_once('X')) {
                if let (Ok(pw), Ok(ph)) = (sw.parse::<u32>(), sh.parse::<u32>()) {
                    w = Some(pw);
                    h = Some(ph);
                }
            }
        } else if let Some(v) = arg.strip_prefix("--width=") {
            if let Ok(pw) = v.parse::<u32>() {
                w = Some(pw);
            }
        } else if let Some(v) = arg.strip_prefix("--height=") {
            if let Ok(ph) = v.parse::<u32>() {
                h = Some(ph);
            }
        }
    }

    let ww = w.unwrap_or(1280).max(1);
    let hh = h.unwrap_or(720).max(1);
    (ww, hh)
}

fn parse_mesh_arg(args: &[String]) -> Option<PathBuf> {
    args.iter()
        .rev()
        .find_map(|arg| arg.strip_prefix("--mesh="))
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}

fn parse_fixed_time_arg(args: &[String]) -> Option<f32> {
    let raw = args
        .iter()
        .rev()
        .find_map(|arg| arg.strip_prefix("--fixed-time="))?;
    match raw.parse::<f32>() {
        Ok(t) if t.is_finite() => Some(t),
        _ => {
            log::warn!("Ignoring invalid --fixed-time '{}'", raw);
            None
        }
    }
}

fn load_mesh_text(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read mesh file: {}", path.display())),
        None => Ok(DEFAULT_MESH.to_owned()),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let backends = parse_backend_arg(&args);
    let show_fps = parse_show_fps_arg(&args);
    let (width, height) = parse_size_args(&args);
    let mesh_path = parse_mesh_arg(&args);
    let fixed_time = parse_fixed_time_arg(&args);
    log::info!(
        "Starting Lumen3D. Backend: {:?}, show_fps={}, window_size={}x{}, mesh={}, fixed_time={:?}",
        backends,
        show_fps,
        width,
        height,
        mesh_path
            .as_ref()
            .map_or_else(|| "<built-in cube>".to_owned(), |p| p.display().to_string()),
        fixed_time
    );

    let mesh_text = load_mesh_text(mesh_path.as_ref())?;

    platform::run_with_renderer(platform::RunConfig {
        backends,
        width,
        height,
        show_fps,
        mesh_text,
        fixed_time,
    })?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn backend_flag() {
        assert_eq!(parse_backend_arg(&args(&[])), wgpu::Backends::all());
        assert_eq!(
            parse_backend_arg(&args(&["--gpu-backend=VK"])),
            wgpu::Backends::VULKAN
        );
        assert_eq!(
            parse_backend_arg(&args(&["--gpu-backend=nope"])),
            wgpu::Backends::all()
        );
    }

    #[test]
    fn show_fps_flag() {
        assert!(!parse_show_fps_arg(&args(&[])));
        assert!(parse_show_fps_arg(&args(&["--show-fps"])));
        assert!(parse_show_fps_arg(&args(&["--show-fps=on"])));
        assert!(!parse_show_fps_arg(&args(&["--show-fps=off"])));
    }

    #[test]
    fn size_flags() {
        assert_eq!(parse_size_args(&args(&[])), (1280, 720));
        assert_eq!(parse_size_args(&args(&["--size=800X600"])), (800, 600));
        assert_eq!(
            parse_size_args(&args(&["--width=640", "--height=0"])),
            (640, 1)
        );
        assert_eq!(parse_size_args(&args(&["--size=bad"])), (1280, 720));
    }

    #[test]
    fn mesh_flag_last_wins() {
        assert_eq!(parse_mesh_arg(&args(&[])), None);
        assert_eq!(parse_mesh_arg(&args(&["--mesh="])), None);
        assert_eq!(
            parse_mesh_arg(&args(&["--mesh=a.obj", "--mesh=b.obj"])),
            Some(PathBuf::from("b.obj"))
        );
    }

    #[test]
    fn fixed_time_flag() {
        assert_eq!(parse_fixed_time_arg(&args(&[])), None);
        assert_eq!(parse_fixed_time_arg(&args(&["--fixed-time=0.5"])), Some(0.5));
        assert_eq!(parse_fixed_time_arg(&args(&["--fixed-time=soon"])), None);
        assert_eq!(parse_fixed_time_arg(&args(&["--fixed-time=inf"])), None);
    }

    #[test]
    fn missing_mesh_file_is_an_error() {
        let path = PathBuf::from("/definitely/not/here.obj");
        let err = load_mesh_text(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read mesh file"));
    }

    #[test]
    fn built_in_cube_imports() {
        let text = load_mesh_text(None).unwrap();
        let mesh = asset::parse(&text).unwrap().assemble().unwrap();
        assert_eq!(mesh.indices.len(), 36);
        assert_eq!(mesh.layout, asset::VertexLayout::PositionTexcoordNormal);
    }
}
