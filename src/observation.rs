use crate::error::ObservationError;

use nalgebra::Vector2;
use ndarray::ArrayView2;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Observable features of a single lensed image
///
/// Flat order is `(x, y, g)` or `(x, y, dx, dy, g)` when proper motion is present.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ImageFeatures {
    /// Position on the sky, arcsec
    pub x: f64,
    pub y: f64,
    /// Proper motion
    pub pm: Option<ProperMotion>,
    /// Magnitude
    pub g: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ProperMotion {
    pub dx: f64,
    pub dy: f64,
}

impl From<Vector2<f64>> for ProperMotion {
    fn from(v: Vector2<f64>) -> Self {
        Self { dx: v.x, dy: v.y }
    }
}

impl ImageFeatures {
    pub fn new(x: f64, y: f64, g: f64) -> Self {
        Self { x, y, pm: None, g }
    }

    pub fn with_proper_motion(x: f64, y: f64, dx: f64, dy: f64, g: f64) -> Self {
        Self {
            x,
            y,
            pm: Some(ProperMotion { dx, dy }),
            g,
        }
    }

    /// Number of features, 3 or 5
    pub fn nfeatures(&self) -> usize {
        if self.pm.is_some() { 5 } else { 3 }
    }

    pub fn has_proper_motion(&self) -> bool {
        self.pm.is_some()
    }

    /// `(name, value)` pairs in the flat order
    pub fn named(&self) -> Vec<(&'static str, f64)> {
        let mut features = vec![("x", self.x), ("y", self.y)];
        if let Some(pm) = self.pm {
            features.push(("dx", pm.dx));
            features.push(("dy", pm.dy));
        }
        features.push(("g", self.g));
        features
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.named().into_iter().map(|(_, value)| value).collect()
    }

    fn from_flat(values: &[f64]) -> Self {
        match *values {
            [x, y, dx, dy, g] => Self::with_proper_motion(x, y, dx, dy, g),
            [x, y, g] => Self::new(x, y, g),
            _ => unreachable!("feature vector length is checked by the caller"),
        }
    }
}

/// Observed lensed image: feature values and their independent 1-sigma uncertainties
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(try_from = "ObservedImageParameters")]
pub struct ObservedImage {
    value: ImageFeatures,
    sigma: ImageFeatures,
}

impl ObservedImage {
    /// Both `value` and `sigma` must have the same layout, `sigma` must be positive and finite
    pub fn new(value: ImageFeatures, sigma: ImageFeatures) -> Result<Self, ObservationError> {
        if value.has_proper_motion() != sigma.has_proper_motion() {
            return Err(ObservationError::UncertaintyLayout);
        }
        for (feature, x) in value.named() {
            if !x.is_finite() {
                return Err(ObservationError::NonFiniteValue { feature, value: x });
            }
        }
        for (feature, s) in sigma.named() {
            if !(s.is_finite() && s > 0.0) {
                return Err(ObservationError::InvalidUncertainty { feature, value: s });
            }
        }
        Ok(Self { value, sigma })
    }

    /// Image from a flat row of values followed by uncertainties
    ///
    /// A row is `(x, y, g, sx, sy, sg)` or `(x, y, dx, dy, g, sx, sy, sdx, sdy, sg)`.
    pub fn from_row(row: &[f64]) -> Result<Self, ObservationError> {
        if row.len() != 6 && row.len() != 10 {
            return Err(ObservationError::WrongRowLength { actual: row.len() });
        }
        let (value, sigma) = row.split_at(row.len() / 2);
        Self::new(ImageFeatures::from_flat(value), ImageFeatures::from_flat(sigma))
    }

    pub fn value(&self) -> &ImageFeatures {
        &self.value
    }

    pub fn sigma(&self) -> &ImageFeatures {
        &self.sigma
    }

    pub fn has_proper_motion(&self) -> bool {
        self.value.has_proper_motion()
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename = "ObservedImage")]
struct ObservedImageParameters {
    value: ImageFeatures,
    sigma: ImageFeatures,
}

impl TryFrom<ObservedImageParameters> for ObservedImage {
    type Error = ObservationError;

    fn try_from(p: ObservedImageParameters) -> Result<Self, Self::Error> {
        Self::new(p.value, p.sigma)
    }
}

/// Ordered observed images of a single lensed quasar
///
/// All images share the same layout: either all of them have proper motion or none.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(try_from = "Vec<ObservedImage>", into = "Vec<ObservedImage>")]
pub struct ObservedData {
    images: Vec<ObservedImage>,
}

impl ObservedData {
    pub fn new(images: Vec<ObservedImage>) -> Result<Self, ObservationError> {
        let with_pm = images.iter().filter(|image| image.has_proper_motion()).count();
        let without_pm = images.len() - with_pm;
        if with_pm != 0 && without_pm != 0 {
            return Err(ObservationError::MixedLayout {
                with_pm,
                without_pm,
            });
        }
        Ok(Self { images })
    }

    /// Data from flat rows, see [ObservedImage::from_row]
    pub fn from_rows<I, R>(rows: I) -> Result<Self, ObservationError>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[f64]>,
    {
        let images = rows
            .into_iter()
            .map(|row| ObservedImage::from_row(row.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(images)
    }

    /// Data from a table with one image per row and 6 or 10 columns
    pub fn from_array(table: ArrayView2<f64>) -> Result<Self, ObservationError> {
        let images = table
            .rows()
            .into_iter()
            .map(|row| ObservedImage::from_row(&row.to_vec()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(images)
    }

    pub fn images(&self) -> &[ObservedImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// `None` for empty data
    pub fn has_proper_motion(&self) -> Option<bool> {
        self.images.first().map(ObservedImage::has_proper_motion)
    }
}

impl TryFrom<Vec<ObservedImage>> for ObservedData {
    type Error = ObservationError;

    fn try_from(images: Vec<ObservedImage>) -> Result<Self, Self::Error> {
        Self::new(images)
    }
}

impl From<ObservedData> for Vec<ObservedImage> {
    fn from(data: ObservedData) -> Self {
        data.images
    }
}
