//! A complete evolvable picture: a Top-rooted function tree plus its sampling policy.
//!
//! Images are immutable values. Editing operations (`mutated`, `simplified`, `deepclone`) return
//! new images with fresh serial numbers, so an image shared with render workers never changes.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::VERSION;
use crate::foundation::error::{EvolvotronError, EvolvotronResult};
use crate::foundation::xyz::Xyz;
use crate::function::markup::MarkupError;
use crate::function::markup::parser::parse_document;
use crate::function::node::{Node, TreeStats};
use crate::function::registry::{Kind, NodeRegistry};
use crate::function::serial::{NodeInfo, root_function};
use crate::mutation::config::MutationConfig;

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(0);

fn next_serial() -> u64 {
    NEXT_SERIAL.fetch_add(1, Ordering::Relaxed)
}

/// How the frame index maps to the third sampling coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ZSweep {
    /// `cos(pi * (z + 0.5) / frames)`; animations swing back and forth.
    #[default]
    Sinusoidal,
    /// Evenly spaced over `[-1, 1]`.
    Linear,
}

impl ZSweep {
    pub fn as_str(self) -> &'static str {
        match self {
            ZSweep::Sinusoidal => "sinusoidal",
            ZSweep::Linear => "linear",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sinusoidal" => Some(ZSweep::Sinusoidal),
            "linear" => Some(ZSweep::Linear),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Projection {
    #[default]
    Planar,
    /// Pixel x/y are longitude/latitude on a sphere whose radius follows the z sweep.
    Spheremap,
}

impl Projection {
    pub fn as_str(self) -> &'static str {
        match self {
            Projection::Planar => "planar",
            Projection::Spheremap => "spheremap",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "planar" => Some(Projection::Planar),
            "spheremap" => Some(Projection::Spheremap),
            _ => None,
        }
    }
}

/// Warnings and errors gathered while loading a function document.
///
/// A load that produced an image may still carry warnings (a version mismatch, a defaulted
/// attribute). A failed load carries at least one error line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    lines: Vec<String>,
    failed: bool,
}

impl LoadReport {
    pub(crate) fn warn(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::warn!(message = %msg, "function document warning");
        self.lines.push(format!("Warning: {msg}"));
    }

    pub(crate) fn error(&mut self, msg: impl Into<String>) {
        self.failed = true;
        self.lines.push(format!("Error: {}", msg.into()));
    }

    fn parse_error(&mut self, e: &MarkupError) {
        self.failed = true;
        self.lines.push(format!("Parse error: {e}"));
    }

    /// True when no error was recorded.
    pub fn is_ok(&self) -> bool {
        !self.failed
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// A function tree rooted at a Top node, with its z sweep and projection.
#[derive(Debug)]
pub struct Image {
    root: Node,
    z_sweep: ZSweep,
    projection: Projection,
    locked: bool,
    serial: u64,
}

impl Image {
    /// Wrap a root. Non-Top roots are rejected.
    pub fn new(root: Node, z_sweep: ZSweep, projection: Projection) -> EvolvotronResult<Self> {
        if root.kind() != Kind::Top {
            return Err(EvolvotronError::validation(format!(
                "image root must be {}, got {}",
                Kind::Top,
                root.kind()
            )));
        }
        if !root.ok() {
            return Err(EvolvotronError::validation(
                "image root does not satisfy its kind contracts",
            ));
        }
        Ok(Self::from_top(root, z_sweep, projection, false))
    }

    fn from_top(root: Node, z_sweep: ZSweep, projection: Projection, locked: bool) -> Self {
        Self {
            root,
            z_sweep,
            projection,
            locked,
            serial: next_serial(),
        }
    }

    /// A fresh random image.
    ///
    /// `favourite` names the kind to put directly under the root (with or without the
    /// `Function` prefix); `unwrapped` keeps the root's space transform to a plain scale.
    pub fn new_random(
        registry: &NodeRegistry,
        config: &mut MutationConfig,
        favourite: Option<&str>,
        unwrapped: bool,
        z_sweep: ZSweep,
        projection: Projection,
    ) -> EvolvotronResult<Self> {
        let favourite = match favourite {
            Some(name) => Some(
                registry
                    .lookup(name)
                    .map(|r| r.kind)
                    .ok_or_else(|| {
                        EvolvotronError::validation(format!("unknown function name: {name}"))
                    })?,
            ),
            None => None,
        };
        let root = Node::top_initial(config, favourite, unwrapped);
        Ok(Self::from_top(root, z_sweep, projection, false))
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn z_sweep(&self) -> ZSweep {
        self.z_sweep
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn sinusoidal_z(&self) -> bool {
        self.z_sweep == ZSweep::Sinusoidal
    }

    pub fn spheremap(&self) -> bool {
        self.projection == Projection::Spheremap
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    /// Process-unique identity; every derived image gets its own.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn is_constant(&self) -> bool {
        self.root.is_constant()
    }

    pub fn ok(&self) -> bool {
        self.root.kind() == Kind::Top && self.root.ok()
    }

    pub fn stats(&self) -> TreeStats {
        self.root.stats()
    }

    /// Copy of the tree under a new serial. The copy is unlocked.
    pub fn deepclone(&self) -> Self {
        Self::from_top(self.root.deepclone(), self.z_sweep, self.projection, false)
    }

    pub fn with_locked(&self, locked: bool) -> Self {
        Self::from_top(self.root.deepclone(), self.z_sweep, self.projection, locked)
    }

    pub fn mutated(&self, config: &mut MutationConfig) -> Self {
        let mut root = self.root.deepclone();
        root.mutate(config);
        Self::from_top(root, self.z_sweep, self.projection, false)
    }

    pub fn simplified(&self) -> Self {
        Self::from_top(self.root.simplified(), self.z_sweep, self.projection, false)
    }

    // Sampling.

    /// Map a (possibly fractional) pixel position and frame to a point in function space.
    ///
    /// `sx`, `sy` and `sz` are the image width, height and frame count.
    pub fn sampling_coordinate(&self, x: f64, y: f64, z: u32, sx: u32, sy: u32, sz: u32) -> Xyz {
        use std::f64::consts::{FRAC_PI_2, PI};

        let (sx, sy, sz) = (f64::from(sx), f64::from(sy), f64::from(sz.max(1)));
        let z = f64::from(z);
        match self.projection {
            Projection::Spheremap => {
                let longitude = -PI + 2.0 * PI * x / sx;
                let latitude = FRAC_PI_2 - PI * y / sy;
                let r = match self.z_sweep {
                    ZSweep::Sinusoidal => 0.5 + (PI * z / sz).cos(),
                    ZSweep::Linear => 0.5 + (z + 0.5) / sz,
                };
                Xyz::new(
                    r * longitude.sin() * latitude.cos(),
                    r * longitude.cos() * latitude.cos(),
                    r * latitude.sin(),
                )
            }
            Projection::Planar => Xyz::new(
                -1.0 + 2.0 * x / sx,
                1.0 - 2.0 * y / sy,
                match self.z_sweep {
                    ZSweep::Sinusoidal => (PI * (z + 0.5) / sz).cos(),
                    ZSweep::Linear => -1.0 + 2.0 * (z + 0.5) / sz,
                },
            ),
        }
    }

    /// Unclamped colour for a function-space point; a nominal `[-2, 2]` output spans `0..=255`.
    pub fn rgb(&self, p: Xyz) -> Xyz {
        let v = self.root.evaluate(p);
        (v * 0.5 + Xyz::fill(1.0)) * 127.5
    }

    /// Averaged, clamped colour of one pixel sampled at the given sub-pixel offsets.
    ///
    /// Offsets are in pixel units within `[0, 1)`; an empty slice samples the pixel centre.
    #[allow(clippy::too_many_arguments)]
    pub fn pixel(
        &self,
        x: u32,
        y: u32,
        frame: u32,
        width: u32,
        height: u32,
        frames: u32,
        offsets: &[(f64, f64)],
    ) -> u32 {
        const CENTRE: [(f64, f64); 1] = [(0.5, 0.5)];
        let offsets = if offsets.is_empty() { &CENTRE[..] } else { offsets };

        let mut acc = Xyz::ZERO;
        for &(jx, jy) in offsets {
            let p = self.sampling_coordinate(
                f64::from(x) + jx,
                f64::from(y) + jy,
                frame,
                width,
                height,
                frames,
            );
            acc += self.rgb(p);
        }
        acc /= offsets.len() as f64;
        pack_rgb(acc)
    }

    // Persistence.

    /// Write the function document.
    pub fn save<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "<?xml version=\"1.0\"?>")?;
        writeln!(
            out,
            "<evolvotron-image-function version=\"{VERSION}\" zsweep=\"{}\" projection=\"{}\">",
            self.z_sweep.as_str(),
            self.projection.as_str()
        )?;
        self.root.save_function(out, 1)?;
        writeln!(out, "</evolvotron-image-function>")
    }

    pub fn to_markup(&self) -> String {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.save(&mut out);
        String::from_utf8_lossy(&out).into_owned()
    }

    /// Read a function document.
    ///
    /// On success the report holds any warnings; on failure it explains what was wrong and no
    /// image is built.
    #[tracing::instrument(skip(registry, reader))]
    pub fn load<R: Read>(
        registry: &NodeRegistry,
        reader: &mut R,
    ) -> Result<(Image, LoadReport), LoadReport> {
        let mut report = LoadReport::default();
        let mut src = String::new();
        if let Err(e) = reader.read_to_string(&mut src) {
            report.error(format!("Couldn't read function document: {e}"));
            return Err(report);
        }
        match Self::load_str(registry, &src, &mut report) {
            Some(image) => Ok((image, report)),
            None => Err(report),
        }
    }

    /// Read a function document from a file. A failed load becomes [`EvolvotronError::Load`]
    /// carrying the report text.
    pub fn load_file(
        registry: &NodeRegistry,
        path: &Path,
    ) -> EvolvotronResult<(Image, LoadReport)> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::load(registry, &mut reader).map_err(|report| {
            let text = report.to_string();
            EvolvotronError::load(format!("{}: {}", path.display(), text.trim_end()))
        })
    }

    fn load_str(registry: &NodeRegistry, src: &str, report: &mut LoadReport) -> Option<Image> {
        let doc = match parse_document(src) {
            Ok(doc) => doc,
            Err(e) => {
                report.parse_error(&e);
                return None;
            }
        };
        if doc.name != "evolvotron-image-function" {
            report.error(format!(
                "Expected <evolvotron-image-function> but got \"{}\"",
                doc.name
            ));
            return None;
        }

        match doc.attribute("version") {
            None | Some("") => report.warn("File does not include evolvotron version"),
            Some(v) if v != VERSION => report.warn(format!(
                "File saved from a different evolvotron version: {v}\n(This is version {VERSION})"
            )),
            Some(_) => {}
        }

        let z_sweep = match doc.attribute("zsweep") {
            None | Some("") => {
                report.warn("zsweep attribute not found\nDefaulting to sinusoidal");
                ZSweep::Sinusoidal
            }
            Some(s) => match ZSweep::parse(s) {
                Some(z) => z,
                None => {
                    report.error(format!(
                        "zsweep attribute expected \"sinusoidal\" or \"linear\", but got \"{s}\""
                    ));
                    return None;
                }
            },
        };

        let projection = match doc.attribute("projection") {
            None | Some("") => {
                report.warn("projection attribute not found\nDefaulting to planar");
                Projection::Planar
            }
            Some(s) => match Projection::parse(s) {
                Some(p) => p,
                None => {
                    report.error(format!(
                        "projection attribute expected \"spheremap\" or \"planar\", but got \"{s}\""
                    ));
                    return None;
                }
            },
        };

        let f = root_function(&doc, report)?;
        let info = NodeInfo::from_element(f, report)?;
        let root = Node::create(registry, &info, report)?;
        let root = if root.kind() == Kind::Top {
            root
        } else {
            report.warn(format!(
                "Root function {} is not {}; wrapping it in identity transforms",
                root.kind(),
                Kind::Top
            ));
            Node::top(root)
        };
        Some(Self::from_top(root, z_sweep, projection, false))
    }
}

/// Clamp each channel to `0..=255`, floor, and pack as `0xRRGGBB`.
pub fn pack_rgb(c: Xyz) -> u32 {
    let channel = |v: f64| -> u32 {
        if v.is_nan() {
            0
        } else {
            v.clamp(0.0, 255.0).floor() as u32
        }
    };
    (channel(c.x) << 16) | (channel(c.y) << 8) | channel(c.z)
}

#[cfg(test)]
#[path = "../tests/unit/image.rs"]
mod tests;
