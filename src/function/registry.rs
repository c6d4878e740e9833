use std::collections::HashMap;
use std::fmt;
use std::ops::BitOr;

/// Bitmask grouping node kinds for weighting and gating.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Classification(pub u32);

impl Classification {
    pub const NONE: Self = Self(0);
    pub const CORE: Self = Self(1);
    pub const STRUCTURE: Self = Self(2);
    pub const RENDER: Self = Self(4);
    pub const ITERATIVE: Self = Self(8);
    pub const FRACTAL: Self = Self(16);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for Classification {
    type Output = Self;

    fn bitor(self, o: Self) -> Self {
        Self(self.0 | o.0)
    }
}

/// Fixed shape every node of a kind must have.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contract {
    pub params: usize,
    pub args: usize,
    pub iterative: bool,
    pub classification: Classification,
}

/// Every function a node can compute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    ComposePair,
    ComposeTriple,
    Constant,
    Identity,
    PostTransform,
    PreTransform,
    Top,
    Transform,
    TransformGeneralised,
    Add,
    Multiply,
    Divide,
    Max,
    Min,
    Modulus,
    Exp,
    Sin,
    Cos,
    ChooseStrip,
    ChooseStripBlend,
    ChooseSphere,
    ChooseRect,
    ChooseFrom2InCubeMesh,
    ChooseFrom3InCubeMesh,
    ChooseFrom2InSquareGrid,
    ChooseFrom3InSquareGrid,
    ChooseFrom2InTriangleGrid,
    ChooseFrom3InTriangleGrid,
    ChooseFrom3InDiamondGrid,
    ChooseFrom3InHexagonGrid,
    ChooseFrom2InBorderedHexagonGrid,
    Filter2D,
    Filter3D,
    AverageSamples,
    Streak,
    AverageRing,
    FilterRing,
    ConvolveSamples,
    AccumulateOctaves,
    FriezeGroupHopFreeZ,
    FriezeGroupHopClampZ,
    FriezeGroupHopWarpFreeZ,
    FriezeGroupHopWarpClampZ,
    FriezeGroupJumpFreeZ,
    FriezeGroupJumpClampZ,
    FriezeGroupSidle,
    FriezeGroupSpinhop,
    FriezeGroupSpinjump,
    FriezeGroupSpinsidle,
    FriezeGroupStep,
    Cross,
    GeometricInversion,
    Reflect,
    Derivative,
    DerivativeGeneralised,
    Gradient,
    GradientGeneralised,
    Divergence,
    Curl,
    ScalarLaplacian,
    MandelbrotChoose,
    MandelbrotContour,
    JuliaChoose,
    JuliaContour,
    JuliabrotChoose,
    JuliabrotContour,
    Kaleidoscope,
    KaleidoscopeZRotate,
    KaleidoscopeTwist,
    Windmill,
    WindmillZRotate,
    WindmillTwist,
    Magnitudes,
    Magnitude,
    Cone,
    ExpCone,
    SeparateZ,
    Iterate,
    NoiseOneChannel,
    MultiscaleNoiseOneChannel,
    NoiseThreeChannel,
    MultiscaleNoiseThreeChannel,
    OrthoSphereShaded,
    OrthoSphereShadedBumpMapped,
    OrthoSphereReflect,
    OrthoSphereReflectBumpMapped,
    Shadow,
    ShadowGeneralised,
    CartesianToSpherical,
    SphericalToCartesian,
    EvaluateInSpherical,
    SpiralLinear,
    SpiralLogarithmic,
    IsotropicScale,
    PreTransformGeneralised,
    PostTransformGeneralised,
    TransformQuadratic,
    Rotate,
    Pixelize,
    Voxelize,
}

impl Kind {
    pub const COUNT: usize = 100;

    pub const ALL: [Kind; Self::COUNT] = [
        Kind::ComposePair,
        Kind::ComposeTriple,
        Kind::Constant,
        Kind::Identity,
        Kind::PostTransform,
        Kind::PreTransform,
        Kind::Top,
        Kind::Transform,
        Kind::TransformGeneralised,
        Kind::Add,
        Kind::Multiply,
        Kind::Divide,
        Kind::Max,
        Kind::Min,
        Kind::Modulus,
        Kind::Exp,
        Kind::Sin,
        Kind::Cos,
        Kind::ChooseStrip,
        Kind::ChooseStripBlend,
        Kind::ChooseSphere,
        Kind::ChooseRect,
        Kind::ChooseFrom2InCubeMesh,
        Kind::ChooseFrom3InCubeMesh,
        Kind::ChooseFrom2InSquareGrid,
        Kind::ChooseFrom3InSquareGrid,
        Kind::ChooseFrom2InTriangleGrid,
        Kind::ChooseFrom3InTriangleGrid,
        Kind::ChooseFrom3InDiamondGrid,
        Kind::ChooseFrom3InHexagonGrid,
        Kind::ChooseFrom2InBorderedHexagonGrid,
        Kind::Filter2D,
        Kind::Filter3D,
        Kind::AverageSamples,
        Kind::Streak,
        Kind::AverageRing,
        Kind::FilterRing,
        Kind::ConvolveSamples,
        Kind::AccumulateOctaves,
        Kind::FriezeGroupHopFreeZ,
        Kind::FriezeGroupHopClampZ,
        Kind::FriezeGroupHopWarpFreeZ,
        Kind::FriezeGroupHopWarpClampZ,
        Kind::FriezeGroupJumpFreeZ,
        Kind::FriezeGroupJumpClampZ,
        Kind::FriezeGroupSidle,
        Kind::FriezeGroupSpinhop,
        Kind::FriezeGroupSpinjump,
        Kind::FriezeGroupSpinsidle,
        Kind::FriezeGroupStep,
        Kind::Cross,
        Kind::GeometricInversion,
        Kind::Reflect,
        Kind::Derivative,
        Kind::DerivativeGeneralised,
        Kind::Gradient,
        Kind::GradientGeneralised,
        Kind::Divergence,
        Kind::Curl,
        Kind::ScalarLaplacian,
        Kind::MandelbrotChoose,
        Kind::MandelbrotContour,
        Kind::JuliaChoose,
        Kind::JuliaContour,
        Kind::JuliabrotChoose,
        Kind::JuliabrotContour,
        Kind::Kaleidoscope,
        Kind::KaleidoscopeZRotate,
        Kind::KaleidoscopeTwist,
        Kind::Windmill,
        Kind::WindmillZRotate,
        Kind::WindmillTwist,
        Kind::Magnitudes,
        Kind::Magnitude,
        Kind::Cone,
        Kind::ExpCone,
        Kind::SeparateZ,
        Kind::Iterate,
        Kind::NoiseOneChannel,
        Kind::MultiscaleNoiseOneChannel,
        Kind::NoiseThreeChannel,
        Kind::MultiscaleNoiseThreeChannel,
        Kind::OrthoSphereShaded,
        Kind::OrthoSphereShadedBumpMapped,
        Kind::OrthoSphereReflect,
        Kind::OrthoSphereReflectBumpMapped,
        Kind::Shadow,
        Kind::ShadowGeneralised,
        Kind::CartesianToSpherical,
        Kind::SphericalToCartesian,
        Kind::EvaluateInSpherical,
        Kind::SpiralLinear,
        Kind::SpiralLogarithmic,
        Kind::IsotropicScale,
        Kind::PreTransformGeneralised,
        Kind::PostTransformGeneralised,
        Kind::TransformQuadratic,
        Kind::Rotate,
        Kind::Pixelize,
        Kind::Voxelize,
    ];

    /// Dense index in `0..Kind::COUNT`, matching the position in [`Kind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name used in saved documents.
    pub fn name(self) -> &'static str {
        match self {
            Kind::ComposePair => "FunctionComposePair",
            Kind::ComposeTriple => "FunctionComposeTriple",
            Kind::Constant => "FunctionConstant",
            Kind::Identity => "FunctionIdentity",
            Kind::PostTransform => "FunctionPostTransform",
            Kind::PreTransform => "FunctionPreTransform",
            Kind::Top => "FunctionTop",
            Kind::Transform => "FunctionTransform",
            Kind::TransformGeneralised => "FunctionTransformGeneralised",
            Kind::Add => "FunctionAdd",
            Kind::Multiply => "FunctionMultiply",
            Kind::Divide => "FunctionDivide",
            Kind::Max => "FunctionMax",
            Kind::Min => "FunctionMin",
            Kind::Modulus => "FunctionModulus",
            Kind::Exp => "FunctionExp",
            Kind::Sin => "FunctionSin",
            Kind::Cos => "FunctionCos",
            Kind::ChooseStrip => "FunctionChooseStrip",
            Kind::ChooseStripBlend => "FunctionChooseStripBlend",
            Kind::ChooseSphere => "FunctionChooseSphere",
            Kind::ChooseRect => "FunctionChooseRect",
            Kind::ChooseFrom2InCubeMesh => "FunctionChooseFrom2InCubeMesh",
            Kind::ChooseFrom3InCubeMesh => "FunctionChooseFrom3InCubeMesh",
            Kind::ChooseFrom2InSquareGrid => "FunctionChooseFrom2InSquareGrid",
            Kind::ChooseFrom3InSquareGrid => "FunctionChooseFrom3InSquareGrid",
            Kind::ChooseFrom2InTriangleGrid => "FunctionChooseFrom2InTriangleGrid",
            Kind::ChooseFrom3InTriangleGrid => "FunctionChooseFrom3InTriangleGrid",
            Kind::ChooseFrom3InDiamondGrid => "FunctionChooseFrom3InDiamondGrid",
            Kind::ChooseFrom3InHexagonGrid => "FunctionChooseFrom3InHexagonGrid",
            Kind::ChooseFrom2InBorderedHexagonGrid => "FunctionChooseFrom2InBorderedHexagonGrid",
            Kind::Filter2D => "FunctionFilter2D",
            Kind::Filter3D => "FunctionFilter3D",
            Kind::AverageSamples => "FunctionAverageSamples",
            Kind::Streak => "FunctionStreak",
            Kind::AverageRing => "FunctionAverageRing",
            Kind::FilterRing => "FunctionFilterRing",
            Kind::ConvolveSamples => "FunctionConvolveSamples",
            Kind::AccumulateOctaves => "FunctionAccumulateOctaves",
            Kind::FriezeGroupHopFreeZ => "FunctionFriezeGroupHopFreeZ",
            Kind::FriezeGroupHopClampZ => "FunctionFriezeGroupHopClampZ",
            Kind::FriezeGroupHopWarpFreeZ => "FunctionFriezeGroupHopWarpFreeZ",
            Kind::FriezeGroupHopWarpClampZ => "FunctionFriezeGroupHopWarpClampZ",
            Kind::FriezeGroupJumpFreeZ => "FunctionFriezeGroupJumpFreeZ",
            Kind::FriezeGroupJumpClampZ => "FunctionFriezeGroupJumpClampZ",
            Kind::FriezeGroupSidle => "FunctionFriezeGroupSidle",
            Kind::FriezeGroupSpinhop => "FunctionFriezeGroupSpinhop",
            Kind::FriezeGroupSpinjump => "FunctionFriezeGroupSpinjump",
            Kind::FriezeGroupSpinsidle => "FunctionFriezeGroupSpinsidle",
            Kind::FriezeGroupStep => "FunctionFriezeGroupStep",
            Kind::Cross => "FunctionCross",
            Kind::GeometricInversion => "FunctionGeometricInversion",
            Kind::Reflect => "FunctionReflect",
            Kind::Derivative => "FunctionDerivative",
            Kind::DerivativeGeneralised => "FunctionDerivativeGeneralised",
            Kind::Gradient => "FunctionGradient",
            Kind::GradientGeneralised => "FunctionGradientGeneralised",
            Kind::Divergence => "FunctionDivergence",
            Kind::Curl => "FunctionCurl",
            Kind::ScalarLaplacian => "FunctionScalarLaplacian",
            Kind::MandelbrotChoose => "FunctionMandelbrotChoose",
            Kind::MandelbrotContour => "FunctionMandelbrotContour",
            Kind::JuliaChoose => "FunctionJuliaChoose",
            Kind::JuliaContour => "FunctionJuliaContour",
            Kind::JuliabrotChoose => "FunctionJuliabrotChoose",
            Kind::JuliabrotContour => "FunctionJuliabrotContour",
            Kind::Kaleidoscope => "FunctionKaleidoscope",
            Kind::KaleidoscopeZRotate => "FunctionKaleidoscopeZRotate",
            Kind::KaleidoscopeTwist => "FunctionKaleidoscopeTwist",
            Kind::Windmill => "FunctionWindmill",
            Kind::WindmillZRotate => "FunctionWindmillZRotate",
            Kind::WindmillTwist => "FunctionWindmillTwist",
            Kind::Magnitudes => "FunctionMagnitudes",
            Kind::Magnitude => "FunctionMagnitude",
            Kind::Cone => "FunctionCone",
            Kind::ExpCone => "FunctionExpCone",
            Kind::SeparateZ => "FunctionSeparateZ",
            Kind::Iterate => "FunctionIterate",
            Kind::NoiseOneChannel => "FunctionNoiseOneChannel",
            Kind::MultiscaleNoiseOneChannel => "FunctionMultiscaleNoiseOneChannel",
            Kind::NoiseThreeChannel => "FunctionNoiseThreeChannel",
            Kind::MultiscaleNoiseThreeChannel => "FunctionMultiscaleNoiseThreeChannel",
            Kind::OrthoSphereShaded => "FunctionOrthoSphereShaded",
            Kind::OrthoSphereShadedBumpMapped => "FunctionOrthoSphereShadedBumpMapped",
            Kind::OrthoSphereReflect => "FunctionOrthoSphereReflect",
            Kind::OrthoSphereReflectBumpMapped => "FunctionOrthoSphereReflectBumpMapped",
            Kind::Shadow => "FunctionShadow",
            Kind::ShadowGeneralised => "FunctionShadowGeneralised",
            Kind::CartesianToSpherical => "FunctionCartesianToSpherical",
            Kind::SphericalToCartesian => "FunctionSphericalToCartesian",
            Kind::EvaluateInSpherical => "FunctionEvaluateInSpherical",
            Kind::SpiralLinear => "FunctionSpiralLinear",
            Kind::SpiralLogarithmic => "FunctionSpiralLogarithmic",
            Kind::IsotropicScale => "FunctionIsotropicScale",
            Kind::PreTransformGeneralised => "FunctionPreTransformGeneralised",
            Kind::PostTransformGeneralised => "FunctionPostTransformGeneralised",
            Kind::TransformQuadratic => "FunctionTransformQuadratic",
            Kind::Rotate => "FunctionRotate",
            Kind::Pixelize => "FunctionPixelize",
            Kind::Voxelize => "FunctionVoxelize",
        }
    }

    pub fn contract(self) -> Contract {
        use Classification as C;
        let (params, args, iterative, classification) = match self {
            Kind::ComposePair => (0, 2, false, C::NONE),
            Kind::ComposeTriple => (0, 3, false, C::NONE),
            Kind::Constant => (3, 0, false, C::CORE),
            Kind::Identity => (0, 0, false, C::CORE),
            Kind::PostTransform => (12, 1, false, C::CORE),
            Kind::PreTransform => (12, 1, false, C::CORE),
            Kind::Top => (24, 1, false, C::CORE),
            Kind::Transform => (12, 0, false, C::CORE),
            Kind::TransformGeneralised => (0, 4, false, C::CORE),
            Kind::Add
            | Kind::Multiply
            | Kind::Divide
            | Kind::Max
            | Kind::Min
            | Kind::Modulus
            | Kind::Cross => (0, 2, false, C::NONE),
            Kind::Exp | Kind::Sin | Kind::Cos => (0, 0, false, C::NONE),
            Kind::ChooseStrip => (3, 3, false, C::STRUCTURE),
            Kind::ChooseStripBlend => (6, 4, false, C::STRUCTURE),
            Kind::ChooseSphere | Kind::ChooseRect => (0, 4, false, C::STRUCTURE),
            Kind::ChooseFrom2InCubeMesh
            | Kind::ChooseFrom2InSquareGrid
            | Kind::ChooseFrom2InTriangleGrid => (0, 2, false, C::STRUCTURE),
            Kind::ChooseFrom3InCubeMesh
            | Kind::ChooseFrom3InSquareGrid
            | Kind::ChooseFrom3InTriangleGrid
            | Kind::ChooseFrom3InDiamondGrid
            | Kind::ChooseFrom3InHexagonGrid => (0, 3, false, C::STRUCTURE),
            Kind::ChooseFrom2InBorderedHexagonGrid => (1, 2, false, C::STRUCTURE),
            Kind::Filter2D => (2, 1, false, C::NONE),
            Kind::Filter3D => (3, 1, false, C::NONE),
            Kind::AverageSamples | Kind::Streak => (3, 1, true, C::ITERATIVE),
            Kind::AverageRing | Kind::FilterRing => (1, 1, true, C::ITERATIVE),
            Kind::ConvolveSamples => (3, 2, true, C::ITERATIVE),
            Kind::AccumulateOctaves | Kind::Iterate => (0, 1, true, C::ITERATIVE),
            Kind::FriezeGroupHopFreeZ | Kind::FriezeGroupJumpFreeZ => {
                (0, 1, false, C::STRUCTURE)
            }
            Kind::FriezeGroupHopClampZ
            | Kind::FriezeGroupJumpClampZ
            | Kind::FriezeGroupSidle
            | Kind::FriezeGroupSpinhop
            | Kind::FriezeGroupSpinjump
            | Kind::FriezeGroupSpinsidle
            | Kind::FriezeGroupStep => (1, 1, false, C::STRUCTURE),
            Kind::FriezeGroupHopWarpFreeZ => (3, 2, false, C::STRUCTURE),
            Kind::FriezeGroupHopWarpClampZ => (4, 2, false, C::STRUCTURE),
            Kind::GeometricInversion => (0, 1, false, C::NONE),
            Kind::Reflect => (0, 3, false, C::NONE),
            Kind::Derivative => (3, 1, false, C::NONE),
            Kind::DerivativeGeneralised | Kind::GradientGeneralised => (0, 2, false, C::NONE),
            Kind::Gradient | Kind::Divergence | Kind::Curl | Kind::ScalarLaplacian => {
                (0, 1, false, C::NONE)
            }
            Kind::MandelbrotChoose => (0, 2, true, C::ITERATIVE | C::FRACTAL),
            Kind::MandelbrotContour => (0, 0, true, C::ITERATIVE | C::FRACTAL),
            Kind::JuliaChoose => (2, 2, true, C::ITERATIVE | C::FRACTAL),
            Kind::JuliaContour => (2, 0, true, C::ITERATIVE | C::FRACTAL),
            Kind::JuliabrotChoose => (16, 2, true, C::ITERATIVE | C::FRACTAL),
            Kind::JuliabrotContour => (16, 0, true, C::ITERATIVE | C::FRACTAL),
            Kind::Kaleidoscope | Kind::Windmill => (1, 1, false, C::STRUCTURE),
            Kind::KaleidoscopeZRotate
            | Kind::KaleidoscopeTwist
            | Kind::WindmillZRotate
            | Kind::WindmillTwist => (2, 1, false, C::STRUCTURE),
            Kind::Magnitudes => (0, 3, false, C::NONE),
            Kind::Magnitude => (3, 1, false, C::NONE),
            Kind::Cone | Kind::ExpCone => (0, 0, false, C::NONE),
            Kind::SeparateZ => (3, 2, false, C::NONE),
            Kind::NoiseOneChannel
            | Kind::MultiscaleNoiseOneChannel
            | Kind::NoiseThreeChannel
            | Kind::MultiscaleNoiseThreeChannel => (0, 0, false, C::NONE),
            Kind::OrthoSphereShaded => (3, 2, false, C::RENDER),
            Kind::OrthoSphereShadedBumpMapped => (3, 3, false, C::RENDER),
            Kind::OrthoSphereReflect => (0, 2, false, C::RENDER),
            Kind::OrthoSphereReflectBumpMapped => (0, 3, false, C::RENDER),
            Kind::Shadow => (4, 1, false, C::NONE),
            Kind::ShadowGeneralised => (1, 2, false, C::NONE),
            Kind::CartesianToSpherical | Kind::SphericalToCartesian => (0, 0, false, C::NONE),
            Kind::EvaluateInSpherical
            | Kind::SpiralLinear
            | Kind::SpiralLogarithmic
            | Kind::IsotropicScale
            | Kind::Rotate => (0, 1, false, C::NONE),
            Kind::PreTransformGeneralised | Kind::PostTransformGeneralised => {
                (0, 5, false, C::CORE)
            }
            Kind::TransformQuadratic => (30, 0, false, C::CORE),
            Kind::Pixelize | Kind::Voxelize => (3, 0, false, C::STRUCTURE),
        };
        Contract {
            params,
            args,
            iterative,
            classification,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Metadata for one registered kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub kind: Kind,
    pub name: &'static str,
    pub contract: Contract,
}

impl Registration {
    fn new(kind: Kind) -> Self {
        Self {
            kind,
            name: kind.name(),
            contract: kind.contract(),
        }
    }
}

/// Name to kind lookup table used when reading saved documents and resolving user-chosen
/// kinds by name.
///
/// Built once by the caller and passed by reference; there is no process-wide instance.
#[derive(Clone, Debug)]
pub struct NodeRegistry {
    registrations: Vec<Registration>,
    by_name: HashMap<&'static str, Kind>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    pub fn new() -> Self {
        let registrations: Vec<Registration> =
            Kind::ALL.iter().copied().map(Registration::new).collect();
        let by_name = registrations.iter().map(|r| (r.name, r.kind)).collect();
        Self {
            registrations,
            by_name,
        }
    }

    /// Look up by saved name. The `Function` prefix is optional.
    pub fn lookup(&self, name: &str) -> Option<&Registration> {
        let kind = self
            .by_name
            .get(name)
            .or_else(|| self.by_name.get(format!("Function{name}").as_str()))?;
        Some(self.get(*kind))
    }

    pub fn get(&self, kind: Kind) -> &Registration {
        &self.registrations[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.iter()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/function/registry.rs"]
mod tests;
