//! `sdfview` binary: opens a window on a raw SDF grid or a synthetic sphere.
//!
//! ```text
//! sdfview [--options FILE.toml] [RAW NX NY NZ SX SY SZ]
//! ```

use std::path::PathBuf;

use glam::{UVec3, Vec3};
use sdfview::{options::Options, viewer::Viewer, volume::SdfGrid};

const USAGE: &str = "Usage: sdfview [--options FILE.toml] [RAW NX NY NZ SX SY SZ]";

/// Resolution of the sphere shown when no grid file is given.
const DEMO_RESOLUTION: u32 = 64;

struct Args {
    options: Option<PathBuf>,
    raw: Option<(PathBuf, UVec3, Vec3)>,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut options = None;
    let mut positional = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--options" {
            let path = iter.next().ok_or("--options needs a file")?;
            options = Some(PathBuf::from(path));
        } else {
            positional.push(arg.as_str());
        }
    }

    let raw = match positional.as_slice() {
        [] => None,
        [path, nx, ny, nz, sx, sy, sz] => {
            let res = |s: &str| {
                s.parse::<u32>()
                    .map_err(|e| format!("bad resolution '{s}': {e}"))
            };
            let len = |s: &str| {
                s.parse::<f32>().map_err(|e| format!("bad size '{s}': {e}"))
            };
            Some((
                PathBuf::from(*path),
                UVec3::new(res(*nx)?, res(*ny)?, res(*nz)?),
                Vec3::new(len(*sx)?, len(*sy)?, len(*sz)?),
            ))
        }
        _ => return Err(USAGE.into()),
    };
    Ok(Args { options, raw })
}

fn load_grid(
    raw: Option<&(PathBuf, UVec3, Vec3)>,
    options: &Options,
) -> Result<SdfGrid, sdfview::SdfViewError> {
    if let Some((path, resolution, size)) = raw {
        return SdfGrid::from_raw_file(path, *resolution, *size);
    }
    let size = Vec3::splat(2.0);
    let snorm_width = size.length() * options.raymarch.band_width_factor;
    log::info!("no grid given, showing a sphere");
    SdfGrid::from_distance_fn(
        UVec3::splat(DEMO_RESOLUTION),
        size,
        snorm_width,
        |p| p.length() - 0.8,
    )
}

fn main() {
    env_logger::init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&argv) {
        Ok(args) => args,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    let options = match args.options.as_deref().map(Options::load) {
        None => Options::default(),
        Some(Ok(options)) => options,
        Some(Err(e)) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    let grid = match load_grid(args.raw.as_ref(), &options) {
        Ok(grid) => grid,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    let result = Viewer::builder()
        .with_grid(grid)
        .with_options(options)
        .build()
        .run();
    if let Err(e) = result {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn empty_args_show_the_sphere() {
        let args = parse_args(&[]).unwrap();
        assert!(args.options.is_none());
        assert!(args.raw.is_none());
    }

    #[test]
    fn raw_grid_with_options() {
        let args = parse_args(&argv(&[
            "--options", "o.toml", "g.raw", "4", "5", "6", "1", "2", "3",
        ]))
        .unwrap();
        assert_eq!(args.options, Some(PathBuf::from("o.toml")));
        let (path, res, size) = args.raw.unwrap();
        assert_eq!(path, PathBuf::from("g.raw"));
        assert_eq!(res, UVec3::new(4, 5, 6));
        assert_eq!(size, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn partial_grid_args_are_rejected() {
        assert!(parse_args(&argv(&["g.raw", "4", "4"])).is_err());
        assert!(parse_args(&argv(&["--options"])).is_err());
        assert!(parse_args(&argv(&[
            "g.raw", "x", "4", "4", "1", "1", "1"
        ]))
        .is_err());
    }
}
