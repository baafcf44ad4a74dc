/// Wavefront OBJ importer
///
/// Supports `v`, `vn` and `f` statements (all four corner forms, negative
/// indices included). Geometry before the first `o`/`g` statement belongs to
/// the root node; every `o`/`g` starts a new child node of the root with its
/// own mesh. OBJ indexes positions and normals separately, so each distinct
/// (position, normal) pair becomes one vertex of the imported mesh. Texture
/// coordinates, materials and smoothing groups are skipped.
use std::collections::HashMap;

use log::debug;
use nalgebra::{Point3, Vector3};
use nom::{
    character::complete::{char, i64, space1},
    combinator::{all_consuming, opt},
    multi::separated_list1,
    number::complete::float,
    sequence::preceded,
    IResult,
};

use crate::import::{ImportError, SceneImporter};
use crate::scene::{Face, ImportedMesh, ImportedScene};

#[derive(Debug, Clone, Copy, Default)]
pub struct ObjImporter;

impl SceneImporter for ObjImporter {
    fn name(&self) -> &'static str {
        "obj"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["obj"]
    }

    fn parse(&self, data: &[u8]) -> Result<ImportedScene, ImportError> {
        parse_obj(std::str::from_utf8(data)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Statement<'a> {
    Position(Point3<f32>),
    Normal(Vector3<f32>),
    Face(Vec<Corner>),
    Group(&'a str),
    Ignored,
}

/// One face corner, with raw (1-based or negative) indices
#[derive(Debug, Clone, Copy, PartialEq)]
struct Corner {
    position: i64,
    normal: Option<i64>,
}

/// Parse OBJ text into a scene
pub fn parse_obj(input: &str) -> Result<ImportedScene, ImportError> {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut scene = ImportedScene::with_root();
    let mut group = GroupBuilder::root();

    for (i, text) in input.lines().enumerate() {
        let line = i + 1;
        let statement = parse_line(text)
            .map_err(|e| ImportError::Parse(format!("line {}: {}", line, e)))?;

        match statement {
            Statement::Position(p) => positions.push(p),
            Statement::Normal(n) => normals.push(n),
            Statement::Face(corners) => {
                let mut face = Face::with_capacity(corners.len());
                for corner in corners {
                    let position = resolve(corner.position, positions.len(), line)?;
                    let normal = corner
                        .normal
                        .map(|n| resolve(n, normals.len(), line))
                        .transpose()?;
                    face.push(group.vertex(position, normal, &positions, &normals));
                }
                group.faces.push(face);
            }
            Statement::Group(name) => {
                let next = GroupBuilder::child(name);
                std::mem::replace(&mut group, next).finish_into(&mut scene);
            }
            Statement::Ignored => {}
        }
    }
    group.finish_into(&mut scene);

    debug!(
        "Parsed OBJ: {} positions, {} normals, {} meshes",
        positions.len(),
        normals.len(),
        scene.meshes().len()
    );
    Ok(scene)
}

/// Turn a 1-based or negative OBJ index into a 0-based one
fn resolve(index: i64, len: usize, line: usize) -> Result<usize, ImportError> {
    let resolved = match index {
        i if i > 0 => i - 1,
        i if i < 0 => len as i64 + i,
        _ => -1,
    };

    usize::try_from(resolved)
        .ok()
        .filter(|&r| r < len)
        .ok_or(ImportError::InvalidIndex { line, index })
}

fn parse_line(line: &str) -> Result<Statement<'_>, String> {
    let line = line.split('#').next().unwrap_or_default().trim();
    if line.is_empty() {
        return Ok(Statement::Ignored);
    }

    let (keyword, args) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let args = args.trim();

    match keyword {
        "v" => complete(args, position).map(Statement::Position),
        "vn" => complete(args, vector3).map(Statement::Normal),
        "f" => complete(args, separated_list1(space1, corner)).map(Statement::Face),
        "o" | "g" => Ok(Statement::Group(args)),
        _ => Ok(Statement::Ignored),
    }
}

fn complete<'a, T, P>(args: &'a str, parser: P) -> Result<T, String>
where
    P: FnMut(&'a str) -> IResult<&'a str, T>,
{
    all_consuming(parser)(args)
        .map(|(_, value)| value)
        .map_err(|e| format!("{:?}", e))
}

fn vector3(input: &str) -> IResult<&str, Vector3<f32>> {
    let (input, x) = float(input)?;
    let (input, y) = preceded(space1, float)(input)?;
    let (input, z) = preceded(space1, float)(input)?;
    Ok((input, Vector3::new(x, y, z)))
}

fn position(input: &str) -> IResult<&str, Point3<f32>> {
    let (input, v) = vector3(input)?;
    // Optional w, unused
    let (input, _) = opt(preceded(space1, float))(input)?;
    Ok((input, v.into()))
}

/// `v`, `v/vt`, `v//vn` or `v/vt/vn`
fn corner(input: &str) -> IResult<&str, Corner> {
    let (input, position) = i64(input)?;
    let (input, texture) = opt(preceded(char('/'), opt(i64)))(input)?;
    let (input, normal) = match texture {
        Some(_) => opt(preceded(char('/'), i64))(input)?,
        None => (input, None),
    };
    Ok((input, Corner { position, normal }))
}

/// Geometry collected for the current `o`/`g` block
struct GroupBuilder {
    /// `None` for geometry that goes straight onto the root
    node: Option<Option<String>>,
    lookup: HashMap<(usize, Option<usize>), u32>,
    positions: Vec<Point3<f32>>,
    normals: Vec<Vector3<f32>>,
    has_normals: bool,
    faces: Vec<Face>,
}

impl GroupBuilder {
    fn root() -> Self {
        Self::new(None)
    }

    fn child(name: &str) -> Self {
        Self::new(Some((!name.is_empty()).then(|| name.to_string())))
    }

    fn new(node: Option<Option<String>>) -> Self {
        Self {
            node,
            lookup: HashMap::new(),
            positions: Vec::new(),
            normals: Vec::new(),
            has_normals: false,
            faces: Vec::new(),
        }
    }

    /// Local vertex index for a resolved (position, normal) pair
    fn vertex(
        &mut self,
        position: usize,
        normal: Option<usize>,
        all_positions: &[Point3<f32>],
        all_normals: &[Vector3<f32>],
    ) -> u32 {
        if let Some(&index) = self.lookup.get(&(position, normal)) {
            return index;
        }

        let index = self.positions.len() as u32;
        self.positions.push(all_positions[position]);
        self.normals
            .push(normal.map_or_else(Vector3::zeros, |n| all_normals[n]));
        self.has_normals |= normal.is_some();
        self.lookup.insert((position, normal), index);
        index
    }

    /// Add the collected mesh to the scene; groups without faces are dropped
    fn finish_into(self, scene: &mut ImportedScene) {
        if self.faces.is_empty() {
            return;
        }

        let mut mesh = ImportedMesh::new(self.positions, self.faces);
        if self.has_normals {
            mesh = mesh.with_normals(self.normals);
        }
        let mesh = scene.add_mesh(mesh);

        let node = match self.node {
            Some(name) => scene.add_node(0, name),
            None => 0,
        };
        scene.attach_mesh(node, mesh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneGraph;

    const TWO_GROUPS: &str = "\
# two triangles sharing an edge, one quad in its own group
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
f 1//1 2//1 3//1
f 1//1 3//1 4//1

o quad
v 0 0 1
v 1 0 1
v 1 1 1
v 0 1 1
f -4 -3 -2 -1
";

    #[test]
    fn test_root_and_group_meshes() {
        let scene = parse_obj(TWO_GROUPS).unwrap();

        assert_eq!(scene.node_meshes(0), Some(&[0][..]));
        let children = scene.node_children(0).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(scene.nodes()[children[0]].name.as_deref(), Some("quad"));
        assert_eq!(scene.node_meshes(children[0]), Some(&[1][..]));

        let root_mesh = scene.mesh(0).unwrap();
        assert_eq!(root_mesh.positions.len(), 4);
        assert_eq!(root_mesh.faces, &[vec![0, 1, 2], vec![0, 2, 3]]);
        assert_eq!(root_mesh.normals.map(|n| n.len()), Some(4));

        let quad = scene.mesh(1).unwrap();
        assert_eq!(quad.faces, &[vec![0, 1, 2, 3]]);
        assert_eq!(quad.positions[0], Point3::new(0.0, 0.0, 1.0));
        assert!(quad.normals.is_none());
    }

    #[test]
    fn test_vertices_split_by_normal() {
        let input = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nvn 0 0 -1\nf 1//1 2//1 3//1\nf 1//2 3//2 2//2\n";
        let scene = parse_obj(input).unwrap();
        let mesh = scene.mesh(0).unwrap();

        assert_eq!(mesh.positions.len(), 6);
        assert_eq!(mesh.faces, &[vec![0, 1, 2], vec![3, 4, 5]]);
        let normals = mesh.normals.unwrap();
        assert_eq!(normals[0], Vector3::z());
        assert_eq!(normals[3], -Vector3::z());
    }

    #[test]
    fn test_corner_forms() {
        assert_eq!(corner("3"), Ok(("", Corner { position: 3, normal: None })));
        assert_eq!(corner("3/7"), Ok(("", Corner { position: 3, normal: None })));
        assert_eq!(corner("3//2"), Ok(("", Corner { position: 3, normal: Some(2) })));
        assert_eq!(corner("-1/4/-2"), Ok(("", Corner { position: -1, normal: Some(-2) })));
    }

    #[test]
    fn test_statements() {
        assert_eq!(parse_line("v 1 2.5 -3 1"), Ok(Statement::Position(Point3::new(1.0, 2.5, -3.0))));
        assert_eq!(parse_line("vn 0 1 0  # up"), Ok(Statement::Normal(Vector3::y())));
        assert_eq!(parse_line("g  body "), Ok(Statement::Group("body")));
        assert_eq!(parse_line("usemtl steel"), Ok(Statement::Ignored));
        assert_eq!(parse_line("vt 0.5 0.5"), Ok(Statement::Ignored));
        assert!(parse_line("v 1 2").is_err());
        assert!(parse_line("f 1 x 3").is_err());
    }

    #[test]
    fn test_out_of_range_index() {
        let result = parse_obj("v 0 0 0\nv 1 0 0\nf 1 2 3\n");
        assert!(matches!(result, Err(ImportError::InvalidIndex { line: 3, index: 3 })));

        let result = parse_obj("v 0 0 0\nf 0 1 1\n");
        assert!(matches!(result, Err(ImportError::InvalidIndex { line: 2, index: 0 })));
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        match parse_obj("v 0 0 0\nvn 1 nope 0\n") {
            Err(ImportError::Parse(message)) => assert!(message.starts_with("line 2")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_groups_are_dropped() {
        let scene = parse_obj("g empty\ng\nv 0 0 0\n").unwrap();
        assert!(scene.meshes().is_empty());
        assert!(scene.node_children(0).is_some_and(|c| c.is_empty()));
    }
}
