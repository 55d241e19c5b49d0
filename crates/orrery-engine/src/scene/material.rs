use super::Color;

/// Shading model applied to a mesh material.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Shading {
    /// Flat color, ignores lights.
    Unlit,
    /// Diffuse response to the scene's directional and ambient lights.
    Lambert,
}

/// Surface appearance of a mesh.
///
/// Holds a GPU-backed handle conceptually; release is explicit via
/// [`Material::dispose`] during scene teardown.
#[derive(Debug, Clone)]
pub struct Material {
    pub color: Color,
    pub emissive: Color,
    pub shading: Shading,
    /// Render triangle geometry as its edge lines.
    pub wireframe: bool,
    disposed: bool,
}

impl Material {
    pub fn unlit(color: Color) -> Self {
        Self {
            color,
            emissive: Color::rgba(0.0, 0.0, 0.0, 0.0),
            shading: Shading::Unlit,
            wireframe: false,
            disposed: false,
        }
    }

    pub fn lambert(color: Color) -> Self {
        Self {
            shading: Shading::Lambert,
            ..Self::unlit(color)
        }
    }

    pub fn wireframe(color: Color) -> Self {
        Self {
            wireframe: true,
            ..Self::unlit(color)
        }
    }

    /// Releases the material's GPU-backed state. Idempotent.
    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Material reference held by a mesh: one material, or an ordered list.
#[derive(Debug, Clone)]
pub enum Materials {
    Single(Material),
    List(Vec<Material>),
}

impl Materials {
    /// The material used for drawing (first of a list).
    pub fn primary(&self) -> Option<&Material> {
        match self {
            Materials::Single(m) => Some(m),
            Materials::List(list) => list.first(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        match self {
            Materials::Single(m) => std::slice::from_ref(m).iter(),
            Materials::List(list) => list.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Material> {
        match self {
            Materials::Single(m) => std::slice::from_mut(m).iter_mut(),
            Materials::List(list) => list.iter_mut(),
        }
    }

    /// Releases every referenced material individually.
    pub fn dispose_all(&mut self) {
        for material in self.iter_mut() {
            material.dispose();
        }
    }
}

impl From<Material> for Materials {
    fn from(material: Material) -> Self {
        Materials::Single(material)
    }
}

impl From<Vec<Material>> for Materials {
    fn from(list: Vec<Material>) -> Self {
        Materials::List(list)
    }
}
