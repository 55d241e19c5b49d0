//! Static route table mapping gallery paths to view constructors.

use orrery_engine::session::Visualization;

use crate::views::frustum::Frustum;
use crate::views::materials::MaterialStudy;
use crate::views::model::Model;
use crate::views::primitives::Primitives;
use crate::views::tank::Tank;
use crate::views::terrain::Terrain;

pub struct Route {
    pub path: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub build: fn() -> Box<dyn Visualization>,
}

pub static ROUTES: &[Route] = &[
    Route {
        path: "primitives",
        title: "Geometry primitives",
        description: "A row of spinning primitive shapes under directional light",
        build: || Box::new(Primitives::new()),
    },
    Route {
        path: "terrain",
        title: "Random terrain",
        description: "Wireframe terrain displaced by value noise, rippling over time",
        build: || Box::new(Terrain::new()),
    },
    Route {
        path: "tank",
        title: "Tank",
        description: "Hierarchical tank driving a spline path while its turret tracks a target",
        build: || Box::new(Tank::new()),
    },
    Route {
        path: "frustum",
        title: "Camera frustum",
        description: "A debug camera's view frustum drawn as animated helper lines",
        build: || Box::new(Frustum::new()),
    },
    Route {
        path: "materials",
        title: "Line materials",
        description: "A cube outlined with dashed orange edge lines",
        build: || Box::new(MaterialStudy::new()),
    },
    Route {
        path: "model",
        title: "OBJ model",
        description: "A bundled low-poly tree loaded from a Wavefront OBJ file",
        build: || Box::new(Model::new()),
    },
];

pub fn find(path: &str) -> Option<&'static Route> {
    ROUTES.iter().find(|route| route.path == path)
}
