//! Named model parameters of the four lens model variants

use crate::error::ParametersError;
use crate::lens::{Lens, SieLens, SisLens};

use nalgebra::Vector2;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a single model parameter
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum ParameterName {
    /// Source position relative to the lens in the lens frame, Einstein radii
    #[serde(rename = "xS")]
    SourceX,
    #[serde(rename = "yS")]
    SourceY,
    /// Source proper motion relative to the lens
    #[serde(rename = "dxS")]
    SourcePmX,
    #[serde(rename = "dyS")]
    SourcePmY,
    /// Source magnitude
    #[serde(rename = "gS")]
    SourceMagnitude,
    /// Einstein radius, arcsec
    #[serde(rename = "bL")]
    EinsteinRadius,
    /// SIE axis ratio
    #[serde(rename = "q")]
    AxisRatio,
    /// Lens position on the sky, arcsec
    #[serde(rename = "xL")]
    LensX,
    #[serde(rename = "yL")]
    LensY,
    /// Lens orientation, radians
    #[serde(rename = "theta")]
    Orientation,
}

impl ParameterName {
    /// Short name as used in flat parameter vectors
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SourceX => "xS",
            Self::SourceY => "yS",
            Self::SourcePmX => "dxS",
            Self::SourcePmY => "dyS",
            Self::SourceMagnitude => "gS",
            Self::EinsteinRadius => "bL",
            Self::AxisRatio => "q",
            Self::LensX => "xL",
            Self::LensY => "yL",
            Self::Orientation => "theta",
        }
    }
}

impl fmt::Display for ParameterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lens type and motion mode of a model
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Sis,
    SisProperMotion,
    Sie,
    SieProperMotion,
}

impl ModelKind {
    /// Parameter names in the order of the flat parameter vector
    pub fn parameter_names(self) -> &'static [ParameterName] {
        match self {
            Self::Sis => SisParameters::NAMES,
            Self::SisProperMotion => SisPmParameters::NAMES,
            Self::Sie => SieParameters::NAMES,
            Self::SieProperMotion => SiePmParameters::NAMES,
        }
    }

    pub fn nparams(self) -> usize {
        self.parameter_names().len()
    }

    pub fn has_proper_motion(self) -> bool {
        matches!(self, Self::SisProperMotion | Self::SieProperMotion)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sis => "SIS",
            Self::SisProperMotion => "SIS proper-motion",
            Self::Sie => "SIE",
            Self::SieProperMotion => "SIE proper-motion",
        };
        f.write_str(name)
    }
}

macro_rules! parameters_record {
    (
        $(#[$meta: meta])*
        $name: ident, $kind: ident,
        { $($(#[$field_meta: meta])* $field: ident => $param: ident),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
        pub struct $name {
            $($(#[$field_meta])* pub $field: f64,)+
        }

        impl $name {
            /// Parameter names in the order of the flat parameter vector
            pub const NAMES: &'static [ParameterName] = &[$(ParameterName::$param),+];

            pub const KIND: ModelKind = ModelKind::$kind;

            /// Flat parameter vector
            pub fn to_vec(&self) -> Vec<f64> {
                vec![$(self.$field),+]
            }

            /// Iterator over `(name, value)` pairs in the flat vector order
            pub fn iter_named(&self) -> impl Iterator<Item = (ParameterName, f64)> + use<> {
                [$((ParameterName::$param, self.$field)),+].into_iter()
            }
        }

        impl TryFrom<&[f64]> for $name {
            type Error = ParametersError;

            fn try_from(values: &[f64]) -> Result<Self, Self::Error> {
                let wrong_length = || ParametersError::WrongLength {
                    kind: Self::KIND,
                    expected: Self::NAMES.len(),
                    actual: values.len(),
                };
                if values.len() != Self::NAMES.len() {
                    return Err(wrong_length());
                }
                let mut values = values.iter().copied();
                Ok(Self {
                    $($field: values.next().ok_or_else(wrong_length)?,)+
                })
            }
        }

        impl From<$name> for ModelParameters {
            fn from(params: $name) -> Self {
                Self::$kind(params)
            }
        }
    };
}

parameters_record!(
    /// Singular isothermal sphere lens and a static source
    SisParameters, Sis,
    {
        x_s => SourceX,
        y_s => SourceY,
        g_s => SourceMagnitude,
        b_l => EinsteinRadius,
        x_l => LensX,
        y_l => LensY,
    }
);

parameters_record!(
    /// Singular isothermal sphere lens and a moving source
    SisPmParameters, SisProperMotion,
    {
        x_s => SourceX,
        y_s => SourceY,
        dx_s => SourcePmX,
        dy_s => SourcePmY,
        g_s => SourceMagnitude,
        b_l => EinsteinRadius,
        x_l => LensX,
        y_l => LensY,
    }
);

parameters_record!(
    /// Singular isothermal ellipsoid lens and a static source
    SieParameters, Sie,
    {
        x_s => SourceX,
        y_s => SourceY,
        g_s => SourceMagnitude,
        b_l => EinsteinRadius,
        q => AxisRatio,
        x_l => LensX,
        y_l => LensY,
        theta => Orientation,
    }
);

parameters_record!(
    /// Singular isothermal ellipsoid lens and a moving source
    SiePmParameters, SieProperMotion,
    {
        x_s => SourceX,
        y_s => SourceY,
        dx_s => SourcePmX,
        dy_s => SourcePmY,
        g_s => SourceMagnitude,
        b_l => EinsteinRadius,
        q => AxisRatio,
        x_l => LensX,
        y_l => LensY,
        theta => Orientation,
    }
);

/// Parameters of a lensed quasar model
///
/// The records don't check parameter support, out-of-support values are rejected by the prior.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[non_exhaustive]
pub enum ModelParameters {
    Sis(SisParameters),
    SisProperMotion(SisPmParameters),
    Sie(SieParameters),
    SieProperMotion(SiePmParameters),
}

/// Lens and source configuration shared by all model variants
#[derive(Clone, Debug, PartialEq)]
pub struct LensGeometry {
    pub lens: Lens,
    /// Source position relative to the lens in the lens frame, Einstein radii
    pub source: Vector2<f64>,
    /// Source proper motion in the lens frame
    pub source_pm: Option<Vector2<f64>>,
    pub source_magnitude: f64,
    pub einstein_radius: f64,
    pub lens_position: Vector2<f64>,
    pub orientation: f64,
}

impl ModelParameters {
    /// Parse a flat parameter vector, see [ModelKind::parameter_names] for the order
    pub fn from_slice(kind: ModelKind, values: &[f64]) -> Result<Self, ParametersError> {
        Ok(match kind {
            ModelKind::Sis => SisParameters::try_from(values)?.into(),
            ModelKind::SisProperMotion => SisPmParameters::try_from(values)?.into(),
            ModelKind::Sie => SieParameters::try_from(values)?.into(),
            ModelKind::SieProperMotion => SiePmParameters::try_from(values)?.into(),
        })
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Sis(_) => ModelKind::Sis,
            Self::SisProperMotion(_) => ModelKind::SisProperMotion,
            Self::Sie(_) => ModelKind::Sie,
            Self::SieProperMotion(_) => ModelKind::SieProperMotion,
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            Self::Sis(p) => p.to_vec(),
            Self::SisProperMotion(p) => p.to_vec(),
            Self::Sie(p) => p.to_vec(),
            Self::SieProperMotion(p) => p.to_vec(),
        }
    }

    /// `(name, value)` pairs in the flat vector order
    pub fn named(&self) -> Vec<(ParameterName, f64)> {
        match self {
            Self::Sis(p) => p.iter_named().collect(),
            Self::SisProperMotion(p) => p.iter_named().collect(),
            Self::Sie(p) => p.iter_named().collect(),
            Self::SieProperMotion(p) => p.iter_named().collect(),
        }
    }

    /// Lens and source configuration, the only place where the variants are unpacked
    pub fn geometry(&self) -> LensGeometry {
        match *self {
            Self::Sis(p) => LensGeometry {
                lens: SisLens {}.into(),
                source: Vector2::new(p.x_s, p.y_s),
                source_pm: None,
                source_magnitude: p.g_s,
                einstein_radius: p.b_l,
                lens_position: Vector2::new(p.x_l, p.y_l),
                orientation: 0.0,
            },
            Self::SisProperMotion(p) => LensGeometry {
                lens: SisLens {}.into(),
                source: Vector2::new(p.x_s, p.y_s),
                source_pm: Some(Vector2::new(p.dx_s, p.dy_s)),
                source_magnitude: p.g_s,
                einstein_radius: p.b_l,
                lens_position: Vector2::new(p.x_l, p.y_l),
                orientation: 0.0,
            },
            Self::Sie(p) => LensGeometry {
                lens: SieLens::new(p.q).into(),
                source: Vector2::new(p.x_s, p.y_s),
                source_pm: None,
                source_magnitude: p.g_s,
                einstein_radius: p.b_l,
                lens_position: Vector2::new(p.x_l, p.y_l),
                orientation: p.theta,
            },
            Self::SieProperMotion(p) => LensGeometry {
                lens: SieLens::new(p.q).into(),
                source: Vector2::new(p.x_s, p.y_s),
                source_pm: Some(Vector2::new(p.dx_s, p.dy_s)),
                source_magnitude: p.g_s,
                einstein_radius: p.b_l,
                lens_position: Vector2::new(p.x_l, p.y_l),
                orientation: p.theta,
            },
        }
    }
}
