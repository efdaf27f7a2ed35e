//! Shape attributes bound to model variables.
//!
//! Symbolic bindings are resolved to value references once with [`set_var_references`]; after
//! every step [`update_visual_attributes`] reads the current values back.

use crate::{
    handle::{FmuHandle, ValueRef},
    Error, FmiError,
};

/// A shape attribute: either a literal or the name of a real model variable.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeBinding {
    Constant(f64),
    Variable {
        name: String,
        /// Resolved once by [`set_var_references`]
        value_reference: Option<ValueRef>,
        /// Value read during the last update
        value: f64,
    },
}

impl Default for AttributeBinding {
    fn default() -> Self {
        Self::Constant(0.0)
    }
}

impl From<f64> for AttributeBinding {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}

impl AttributeBinding {
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable {
            name: name.into(),
            value_reference: None,
            value: 0.0,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Self::Constant(_))
    }

    pub fn value(&self) -> f64 {
        match self {
            Self::Constant(value) | Self::Variable { value, .. } => *value,
        }
    }

    pub fn value_reference(&self) -> Option<ValueRef> {
        match self {
            Self::Constant(_) => None,
            Self::Variable {
                value_reference, ..
            } => *value_reference,
        }
    }
}

/// One visual shape of the multibody scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub ident: String,
    pub shape_type: String,
    pub length: AttributeBinding,
    pub width: AttributeBinding,
    pub height: AttributeBinding,
    /// Position of the shape frame
    pub r: [AttributeBinding; 3],
    /// Offset of the shape inside its frame
    pub r_shape: [AttributeBinding; 3],
    pub length_dir: [AttributeBinding; 3],
    pub width_dir: [AttributeBinding; 3],
    /// Row-major rotation matrix
    pub t: [AttributeBinding; 9],
    pub color: [AttributeBinding; 3],
    pub specular_coefficient: AttributeBinding,
}

impl Shape {
    /// A unit-free shape at the origin with identity orientation.
    pub fn new(ident: impl Into<String>, shape_type: impl Into<String>) -> Self {
        let identity = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        Self {
            ident: ident.into(),
            shape_type: shape_type.into(),
            length: 0.0.into(),
            width: 0.0.into(),
            height: 0.0.into(),
            r: Default::default(),
            r_shape: Default::default(),
            length_dir: [1.0.into(), 0.0.into(), 0.0.into()],
            width_dir: [0.0.into(), 1.0.into(), 0.0.into()],
            t: identity.map(AttributeBinding::Constant),
            color: [255.0.into(), 255.0.into(), 255.0.into()],
            specular_coefficient: 0.7.into(),
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttributeBinding> {
        [&self.length, &self.width, &self.height]
            .into_iter()
            .chain(&self.r)
            .chain(&self.r_shape)
            .chain(&self.length_dir)
            .chain(&self.width_dir)
            .chain(&self.t)
            .chain(&self.color)
            .chain(std::iter::once(&self.specular_coefficient))
    }

    pub fn attributes_mut(&mut self) -> impl Iterator<Item = &mut AttributeBinding> {
        [&mut self.length, &mut self.width, &mut self.height]
            .into_iter()
            .chain(&mut self.r)
            .chain(&mut self.r_shape)
            .chain(&mut self.length_dir)
            .chain(&mut self.width_dir)
            .chain(&mut self.t)
            .chain(&mut self.color)
            .chain(std::iter::once(&mut self.specular_coefficient))
    }
}

/// The parsed visual description of a model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisualDescription {
    pub shapes: Vec<Shape>,
}

/// Resolve the value reference of every symbolic binding in `shapes`.
///
/// Stops at the first unknown variable name. Bindings resolved before it keep their reference.
pub fn set_var_references<F: FmuHandle + ?Sized>(shapes: &mut [Shape], fmu: &F) -> Result<(), Error> {
    for shape in shapes.iter_mut() {
        let ident = shape.ident.clone();
        for attr in shape.attributes_mut() {
            if let AttributeBinding::Variable {
                name,
                value_reference,
                ..
            } = attr
            {
                match fmu.value_reference(name) {
                    Ok(vr) => *value_reference = Some(vr),
                    Err(err) => {
                        log::warn!(
                            "Could not resolve variable {name} of shape {ident}: {err}"
                        );
                        return Err(err);
                    }
                }
            }
        }
    }
    Ok(())
}

/// Resolve each shape as a batch of its own.
///
/// A shape naming an unknown variable is logged and keeps the bindings resolved before the
/// failure; the remaining shapes are still resolved. Returns the number of shapes that failed.
pub fn set_var_references_each<F: FmuHandle + ?Sized>(shapes: &mut [Shape], fmu: &F) -> usize {
    let mut failed = 0;
    for shape in shapes.iter_mut() {
        if set_var_references(std::slice::from_mut(shape), fmu).is_err() {
            failed += 1;
        }
    }
    failed
}

/// Read the current value of a symbolic binding. Constants and unresolved bindings are left
/// as they are.
pub fn update_object_attribute<F: FmuHandle + ?Sized>(
    attr: &mut AttributeBinding,
    fmu: &mut F,
) -> Result<(), FmiError> {
    if let AttributeBinding::Variable {
        value_reference: Some(vr),
        value,
        ..
    } = attr
    {
        let mut values = [0.0];
        fmu.get_real(&[*vr], &mut values)?;
        *value = values[0];
    }
    Ok(())
}

/// Refresh all bindings of all shapes after a step.
pub fn update_visual_attributes<F: FmuHandle + ?Sized>(
    shapes: &mut [Shape],
    fmu: &mut F,
) -> Result<(), FmiError> {
    for shape in shapes.iter_mut() {
        for attr in shape.attributes_mut() {
            update_object_attribute(attr, fmu)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_attributes() {
        let mut shape = Shape::new("body", "box");
        assert_eq!(shape.attributes().count(), 28);
        assert!(shape.attributes().all(AttributeBinding::is_constant));

        shape.r[1] = AttributeBinding::variable("body.r_0[2]");
        assert_eq!(shape.attributes().filter(|a| !a.is_constant()).count(), 1);
        assert_eq!(shape.t[4].value(), 1.0);
        assert_eq!(shape.r[1].value_reference(), None);
    }
}
