use std::{
    fs::File,
    io::{self, BufReader, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail, ensure};
use clap::Parser;
use serde::Deserialize;
use vp8_mvpred::{
    FrameAnalysis,
    MacroblockInfo,
    ModeInfoGrid,
    MvPredictor,
    PixelContext,
    Pixel,
    Plane,
    PredictionOptions,
    RefMvSearch,
    SignBias,
};

/// Luma padding of loaded planes. Pixel scoring reads up to a macroblock
/// plus the edge strip past the frame.
const LUMA_PADDING: usize = 48;

#[derive(Parser, Debug)]
#[command(name = "vp8-mvpred", version, about)]
struct Args {
    /// Sets the input file to use, or `-` for stdin
    input: String,

    /// Strategy for choosing the best reference vector
    #[arg(long, short, value_enum, default_value_t = RefMvSearch::Positional)]
    search: RefMvSearch,

    /// Reconstructed current frame (y4m), required by `pixel-scored`
    #[arg(long, requires = "reference")]
    recon: Option<PathBuf>,

    /// Reference frame (y4m), required by `pixel-scored`
    #[arg(long, requires = "recon")]
    reference: Option<PathBuf>,

    /// File to write results in
    #[arg(long, short)]
    output: Option<PathBuf>,
}

/// A fully coded frame of mode info.
#[derive(Deserialize)]
struct FrameInput {
    cols: usize,
    rows: usize,
    #[serde(default)]
    sign_bias: SignBias,
    macroblocks: Vec<MacroblockInfo>,
}

fn main() -> Result<()> {
    #[cfg(feature = "devel")]
    init_logger();

    let args = Args::parse();
    let input = match args.input.as_str() {
        "-" => Box::new(io::stdin()) as Box<dyn Read>,
        f => Box::new(File::open(f).with_context(|| format!("could not open {f}"))?) as Box<dyn Read>,
    };
    let frame: FrameInput =
        serde_json::from_reader(BufReader::new(input)).context("malformed frame description")?;
    let grid = ModeInfoGrid::from_raster(frame.cols, frame.rows, frame.macroblocks)?;

    let results = match (&args.recon, &args.reference) {
        (Some(recon), Some(reference)) => {
            let bit_depth = open_y4m(recon)?.get_bit_depth();
            if bit_depth == 8 {
                analyze_with_pixels::<u8>(&args, &grid, &frame.sign_bias, recon, reference)?
            } else {
                analyze_with_pixels::<u16>(&args, &grid, &frame.sign_bias, recon, reference)?
            }
        }
        _ => {
            if args.search == RefMvSearch::PixelScored {
                bail!("pixel-scored search needs --recon and --reference");
            }
            MvPredictor::<u8>::new(PredictionOptions {
                ref_mv_search: args.search,
            })
            .analyze_frame(&grid, &frame.sign_bias, None)
        }
    };
    print!("{}", serde_json::to_string(&results)?);

    if let Some(output_file) = args.output {
        let mut file = File::create(&output_file)
            .with_context(|| format!("could not create {}", output_file.display()))?;
        let output = serde_json::to_string_pretty(&results)?;
        file.write_all(output.as_bytes())?;
    }

    Ok(())
}

fn open_y4m(path: &Path) -> Result<y4m::Decoder<BufReader<File>>> {
    let file = File::open(path).with_context(|| format!("could not open {}", path.display()))?;
    y4m::Decoder::new(BufReader::new(file))
        .map_err(|e| anyhow::anyhow!("{}: {e:?}", path.display()))
}

/// Reads the luma plane of the first frame of a y4m file, edge-extended
/// into the padding.
fn read_luma<T: Pixel>(path: &Path, grid: &ModeInfoGrid) -> Result<Plane<T>> {
    let mut dec = open_y4m(path)?;
    let (width, height) = (dec.get_width(), dec.get_height());
    ensure!(
        width.div_ceil(16) == grid.cols() && height.div_ceil(16) == grid.rows(),
        "{} is {width}x{height}, which does not match a {}x{} macroblock grid",
        path.display(),
        grid.cols(),
        grid.rows()
    );

    let bytes = dec.get_bytes_per_sample();
    let frame = dec
        .read_frame()
        .map_err(|e| anyhow::anyhow!("{}: {e:?}", path.display()))?;
    let mut plane = Plane::new(width, height, 0, 0, LUMA_PADDING, LUMA_PADDING);
    plane.copy_from_raw_u8(frame.get_y_plane(), width * bytes, bytes);
    plane.pad(width, height);
    Ok(plane)
}

fn analyze_with_pixels<T: Pixel>(
    args: &Args,
    grid: &ModeInfoGrid,
    sign_bias: &SignBias,
    recon: &Path,
    reference: &Path,
) -> Result<FrameAnalysis> {
    let recon = read_luma::<T>(recon, grid)?;
    let reference = read_luma::<T>(reference, grid)?;
    let pixels = PixelContext {
        recon: &recon,
        reference: &reference,
    };

    Ok(MvPredictor::<T>::new(PredictionOptions {
        ref_mv_search: args.search,
    })
    .analyze_frame(grid, sign_bias, Some(&pixels)))
}

#[cfg(feature = "devel")]
fn init_logger() {
    use std::str::FromStr;

    fn level_colored(l: log::Level) -> console::StyledObject<&'static str> {
        use console::style;
        use log::Level;
        match l {
            Level::Trace => style("??").dim(),
            Level::Debug => style("? ").dim(),
            Level::Info => style("> ").green(),
            Level::Warn => style("! ").yellow(),
            Level::Error => style("!!").red(),
        }
    }

    let level = std::env::var("MVPRED_LOG")
        .ok()
        .and_then(|l| log::LevelFilter::from_str(&l).ok())
        .unwrap_or(log::LevelFilter::Info);

    let _ = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{level} {message}",
                level = level_colored(record.level()),
                message = message,
            ));
        })
        .level(log::LevelFilter::Warn)
        .level_for("vp8_mvpred", level)
        .chain(io::stderr())
        .apply();
}

#[cfg(test)]
mod tests {
    use vp8_mvpred::{MbOffset, MotionVector, PredictionMode, RefType};

    use super::*;

    const SIZE: usize = 32;

    fn texture(x: usize, y: usize) -> u8 {
        ((x * x + 3 * y * y + x * y) % 251) as u8
    }

    /// Writes a one-frame 4:2:0 y4m whose luma is `luma(x, y)`.
    fn write_y4m(name: &str, luma: impl Fn(usize, usize) -> u8) -> PathBuf {
        let path = std::env::temp_dir().join(format!("vp8-mvpred-{}-{name}.y4m", std::process::id()));
        let mut data = format!("YUV4MPEG2 W{SIZE} H{SIZE} F30:1 C420jpeg\nFRAME\n").into_bytes();
        for y in 0..SIZE {
            data.extend((0..SIZE).map(|x| luma(x, y)));
        }
        data.extend(std::iter::repeat_n(128u8, 2 * (SIZE / 2) * (SIZE / 2)));
        std::fs::write(&path, data).unwrap();
        path
    }

    fn grid() -> ModeInfoGrid {
        let mut grid = ModeInfoGrid::new(2, 2);
        let last = |row, col| {
            MacroblockInfo::inter(
                PredictionMode::NEWMV,
                RefType::LAST_FRAME,
                MotionVector::new(row, col),
            )
        };
        grid.set(MbOffset { row: 0, col: 1 }, last(40, 40));
        grid.set(MbOffset { row: 1, col: 0 }, last(0, -24));
        grid.set(MbOffset { row: 1, col: 1 }, last(0, 0));
        grid
    }

    fn args(search: &str) -> Args {
        Args::try_parse_from(["vp8-mvpred", "-", "--search", search]).unwrap()
    }

    #[test]
    fn pixel_planes_require_each_other() {
        assert!(Args::try_parse_from(["vp8-mvpred", "-", "--recon", "a.y4m"]).is_err());
        assert!(Args::try_parse_from(["vp8-mvpred", "-", "--reference", "b.y4m"]).is_err());
        assert!(
            Args::try_parse_from(["vp8-mvpred", "-", "--recon", "a.y4m", "--reference", "b.y4m"])
                .is_ok()
        );
    }

    #[test]
    fn luma_is_loaded_and_edge_extended() {
        let path = write_y4m("luma", texture);
        let plane = read_luma::<u8>(&path, &grid()).unwrap();
        std::fs::remove_file(&path).unwrap();

        let org = plane.slice(v_frame::plane::PlaneOffset { x: -4, y: 5 });
        assert_eq!(org[0][4], texture(0, 5));
        assert_eq!(org[0][0], texture(0, 5));
        assert_eq!(plane.p(31, 31), texture(31, 31));
    }

    #[test]
    fn mismatched_frame_size_is_rejected() {
        let path = write_y4m("small", texture);
        let err = read_luma::<u8>(&path, &ModeInfoGrid::new(3, 2));
        std::fs::remove_file(&path).unwrap();
        assert!(err.is_err());
    }

    #[test]
    fn pixel_scored_search_uses_loaded_planes() {
        let recon = write_y4m("recon", |x, y| texture((x + SIZE - 3) % SIZE, y));
        let reference = write_y4m("reference", texture);
        let grid = grid();
        let bias = SignBias::default();

        let scored =
            analyze_with_pixels::<u8>(&args("pixel-scored"), &grid, &bias, &recon, &reference)
                .unwrap();
        let positional =
            analyze_with_pixels::<u8>(&args("positional"), &grid, &bias, &recon, &reference)
                .unwrap();
        std::fs::remove_file(&recon).unwrap();
        std::fs::remove_file(&reference).unwrap();

        let best = |analysis: &FrameAnalysis| {
            analysis.macroblocks[3].first.as_ref().unwrap().near_mvs.best
        };
        assert_eq!(best(&positional), MotionVector::new(40, 40));
        assert_eq!(best(&scored), MotionVector::new(0, -24));
    }
}
