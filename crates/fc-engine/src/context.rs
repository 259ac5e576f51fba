//! Field contexts: the sampled data programs evaluate against.
//!
//! A context is a point table with quadrature weights, named geometry
//! index sets into that table, and one value column per field quantity.
//! The serde `ContextDef` schema is the file form; `build` validates it
//! into the runtime `FieldContext`.

use std::collections::HashMap;

use fc_core::{Real, Value, ValueKind, Vec3};
use fc_expr::GeomDomain;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// One value per context point, kind-uniform.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldData {
    kind: ValueKind,
    values: Vec<Value>,
}

impl FieldData {
    /// Create a column, checking every value against `kind`.
    pub fn new(kind: ValueKind, values: Vec<Value>) -> EngineResult<Self> {
        for (i, v) in values.iter().enumerate() {
            if v.kind() != kind {
                return Err(EngineError::InvalidContext {
                    what: format!(
                        "value {} is {} in a {} column",
                        i,
                        v.kind().label(),
                        kind.label()
                    ),
                });
            }
        }
        Ok(Self { kind, values })
    }

    pub fn from_scalars(values: impl IntoIterator<Item = Real>) -> Self {
        Self {
            kind: ValueKind::Scalar,
            values: values.into_iter().map(Value::Scalar).collect(),
        }
    }

    pub fn from_vectors(values: impl IntoIterator<Item = Vec3>) -> Self {
        Self {
            kind: ValueKind::Vector,
            values: values.into_iter().map(Value::Vector).collect(),
        }
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A named geometry: an index set into the context's point table.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometrySet {
    pub name: String,
    pub domain: GeomDomain,
    pub samples: Vec<usize>,
}

/// Sampled field data a program evaluates against.
#[derive(Debug, Clone, Default)]
pub struct FieldContext {
    points: Vec<Vec3>,
    weights: Vec<Real>,
    geometries: Vec<GeometrySet>,
    geometry_index: HashMap<String, usize>,
    quantities: HashMap<String, FieldData>,
}

impl FieldContext {
    /// Create a context from a point table and aligned quadrature weights.
    pub fn new(points: Vec<Vec3>, weights: Vec<Real>) -> EngineResult<Self> {
        if points.len() != weights.len() {
            return Err(EngineError::LengthMismatch {
                what: "quadrature weights",
                expected: points.len(),
                got: weights.len(),
            });
        }
        for (i, w) in weights.iter().enumerate() {
            if !w.is_finite() {
                return Err(EngineError::InvalidContext {
                    what: format!("weight {i} is not finite"),
                });
            }
        }
        Ok(Self {
            points,
            weights,
            ..Self::default()
        })
    }

    /// Context with unit weights.
    pub fn with_unit_weights(points: Vec<Vec3>) -> Self {
        let weights = vec![1.0; points.len()];
        Self {
            points,
            weights,
            ..Self::default()
        }
    }

    /// Number of sample points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn weights(&self) -> &[Real] {
        &self.weights
    }

    /// Register a named geometry; sample indices must be in range.
    pub fn add_geometry(&mut self, geom: GeometrySet) -> EngineResult<()> {
        if self.geometry_index.contains_key(&geom.name) {
            return Err(EngineError::InvalidContext {
                what: format!("duplicate geometry '{}'", geom.name),
            });
        }
        for &idx in &geom.samples {
            if idx >= self.points.len() {
                return Err(EngineError::InvalidContext {
                    what: format!(
                        "geometry '{}' references point {} (have {})",
                        geom.name,
                        idx,
                        self.points.len()
                    ),
                });
            }
        }
        if geom.domain == GeomDomain::Point && geom.samples.len() != 1 {
            return Err(EngineError::InvalidContext {
                what: format!(
                    "point geometry '{}' must have exactly one sample",
                    geom.name
                ),
            });
        }
        self.geometry_index
            .insert(geom.name.clone(), self.geometries.len());
        self.geometries.push(geom);
        Ok(())
    }

    /// Register a quantity column; must be full-length and finite.
    pub fn add_quantity(&mut self, name: impl Into<String>, data: FieldData) -> EngineResult<()> {
        let name = name.into();
        if self.quantities.contains_key(&name) {
            return Err(EngineError::InvalidContext {
                what: format!("duplicate quantity '{name}'"),
            });
        }
        if data.len() != self.points.len() {
            return Err(EngineError::LengthMismatch {
                what: "quantity column",
                expected: self.points.len(),
                got: data.len(),
            });
        }
        if let Some(i) = data.values().iter().position(|v| !v.is_finite()) {
            return Err(EngineError::InvalidContext {
                what: format!("quantity '{name}' has a non-finite value at point {i}"),
            });
        }
        self.quantities.insert(name, data);
        Ok(())
    }

    pub fn geometry(&self, name: &str) -> Option<&GeometrySet> {
        self.geometry_index.get(name).map(|&i| &self.geometries[i])
    }

    pub fn quantity(&self, name: &str) -> Option<&FieldData> {
        self.quantities.get(name)
    }
}

// --- file schema ---------------------------------------------------------

/// File form of a field context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDef {
    pub points: Vec<[Real; 3]>,
    /// Quadrature weights; defaults to unit weights when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<Real>>,
    #[serde(default)]
    pub geometries: Vec<GeometrySetDef>,
    #[serde(default)]
    pub quantities: Vec<QuantityDataDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometrySetDef {
    pub name: String,
    pub domain: GeomDomain,
    pub samples: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuantityDataDef {
    Scalar { name: String, values: Vec<Real> },
    Complex { name: String, values: Vec<[Real; 2]> },
    Vector { name: String, values: Vec<[Real; 3]> },
}

impl QuantityDataDef {
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar { name, .. } | Self::Complex { name, .. } | Self::Vector { name, .. } => {
                name
            }
        }
    }
}

impl ContextDef {
    /// Validate and build the runtime context.
    pub fn build(&self) -> EngineResult<FieldContext> {
        let points: Vec<Vec3> = self
            .points
            .iter()
            .map(|&[x, y, z]| Vec3::new(x, y, z))
            .collect();
        let weights = match &self.weights {
            Some(w) => w.clone(),
            None => vec![1.0; points.len()],
        };
        let mut ctx = FieldContext::new(points, weights)?;

        for geom in &self.geometries {
            ctx.add_geometry(GeometrySet {
                name: geom.name.clone(),
                domain: geom.domain,
                samples: geom.samples.clone(),
            })?;
        }

        for quantity in &self.quantities {
            let data = match quantity {
                QuantityDataDef::Scalar { values, .. } => FieldData::from_scalars(values.clone()),
                QuantityDataDef::Complex { values, .. } => FieldData {
                    kind: ValueKind::Complex,
                    values: values.iter().map(|&[re, im]| Value::complex(re, im)).collect(),
                },
                QuantityDataDef::Vector { values, .. } => FieldData::from_vectors(
                    values.iter().map(|&[x, y, z]| Vec3::new(x, y, z)),
                ),
            };
            ctx.add_quantity(quantity.name(), data)?;
        }

        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_must_align_with_points() {
        let err = FieldContext::new(vec![Vec3::zeros(); 3], vec![1.0; 2]).unwrap_err();
        assert!(matches!(err, EngineError::LengthMismatch { .. }));
    }

    #[test]
    fn geometry_samples_must_be_in_range() {
        let mut ctx = FieldContext::with_unit_weights(vec![Vec3::zeros(); 2]);
        let err = ctx
            .add_geometry(GeometrySet {
                name: "s".into(),
                domain: GeomDomain::Surface,
                samples: vec![0, 5],
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidContext { .. }));
    }

    #[test]
    fn point_geometries_carry_one_sample() {
        let mut ctx = FieldContext::with_unit_weights(vec![Vec3::zeros(); 3]);
        assert!(
            ctx.add_geometry(GeometrySet {
                name: "probe".into(),
                domain: GeomDomain::Point,
                samples: vec![0, 1],
            })
            .is_err()
        );
        assert!(
            ctx.add_geometry(GeometrySet {
                name: "probe".into(),
                domain: GeomDomain::Point,
                samples: vec![2],
            })
            .is_ok()
        );
    }

    #[test]
    fn quantity_columns_are_checked() {
        let mut ctx = FieldContext::with_unit_weights(vec![Vec3::zeros(); 2]);

        // wrong length
        assert!(
            ctx.add_quantity("T", FieldData::from_scalars([1.0]))
                .is_err()
        );
        // non-finite
        assert!(
            ctx.add_quantity("T", FieldData::from_scalars([1.0, Real::NAN]))
                .is_err()
        );
        // mixed kinds rejected by the column constructor
        assert!(
            FieldData::new(
                ValueKind::Scalar,
                vec![Value::scalar(1.0), Value::vector(0.0, 0.0, 1.0)]
            )
            .is_err()
        );

        assert!(
            ctx.add_quantity("T", FieldData::from_scalars([1.0, 2.0]))
                .is_ok()
        );
        // duplicate
        assert!(
            ctx.add_quantity("T", FieldData::from_scalars([1.0, 2.0]))
                .is_err()
        );
    }

    #[test]
    fn def_builds_with_default_weights() {
        let def = ContextDef {
            points: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
            weights: None,
            geometries: vec![GeometrySetDef {
                name: "line".into(),
                domain: GeomDomain::Line,
                samples: vec![0, 1],
            }],
            quantities: vec![
                QuantityDataDef::Scalar {
                    name: "T".into(),
                    values: vec![300.0, 310.0],
                },
                QuantityDataDef::Vector {
                    name: "E".into(),
                    values: vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                },
            ],
        };

        let ctx = def.build().unwrap();
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.weights(), &[1.0, 1.0]);
        assert_eq!(ctx.quantity("T").unwrap().kind(), ValueKind::Scalar);
        assert_eq!(ctx.quantity("E").unwrap().kind(), ValueKind::Vector);
        assert_eq!(ctx.geometry("line").unwrap().samples, vec![0, 1]);
    }
}
