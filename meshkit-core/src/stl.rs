/// STL importer for binary and ASCII formats
use log::debug;
use nalgebra::{Point3, Vector3};
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending},
    combinator::opt,
    multi::{count, many0},
    number::complete::{float, le_f32, le_u32},
    sequence::preceded,
    IResult,
};

use crate::import::{ImportError, SceneImporter};
use crate::scene::{ImportedMesh, ImportedScene};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// One STL facet: a face normal and three corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Facet {
    pub normal: Vector3<f32>,
    pub vertices: [Point3<f32>; 3],
}

/// STL files hold a single unindexed mesh, imported as one mesh on the root
#[derive(Debug, Clone, Copy, Default)]
pub struct StlImporter;

impl SceneImporter for StlImporter {
    fn name(&self) -> &'static str {
        "stl"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["stl"]
    }

    fn parse(&self, data: &[u8]) -> Result<ImportedScene, ImportError> {
        let facets = parse_stl(data)?;
        debug!("Parsed {} STL facets", facets.len());

        let mut scene = ImportedScene::with_root();
        let mesh = scene.add_mesh(facets_to_mesh(&facets));
        scene.attach_mesh(0, mesh);
        Ok(scene)
    }
}

/// Three vertices per facet, each carrying the facet normal
///
/// Exporters often write zero normals; when every facet does, the mesh is
/// imported without normals so post-processing can generate them.
pub fn facets_to_mesh(facets: &[Facet]) -> ImportedMesh {
    let positions = facets.iter().flat_map(|f| f.vertices).collect();
    let faces = (0..facets.len() as u32)
        .map(|i| vec![3 * i, 3 * i + 1, 3 * i + 2])
        .collect();
    let mesh = ImportedMesh::new(positions, faces);

    if facets.iter().all(|f| f.normal == Vector3::zeros()) {
        mesh
    } else {
        mesh.with_normals(facets.iter().flat_map(|f| [f.normal; 3]).collect())
    }
}

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Vec<Facet>, ImportError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(ImportError::Truncated {
            expected: HEADER_LEN + 4,
            actual: data.len(),
        });
    }

    let triangle_count = u32::from_le_bytes([data[80], data[81], data[82], data[83]]) as usize;
    let expected = HEADER_LEN + 4 + triangle_count * FACET_LEN;
    if data.len() < expected {
        return Err(ImportError::Truncated {
            expected,
            actual: data.len(),
        });
    }

    parse_binary_stl_impl(data)
        .map(|(_, facets)| facets)
        .map_err(|e| ImportError::Parse(format!("binary STL: {:?}", e)))
}

fn parse_binary_stl_impl(input: &[u8]) -> IResult<&[u8], Vec<Facet>> {
    let (input, _) = take(HEADER_LEN)(input)?;
    let (input, triangle_count) = le_u32(input)?;
    count(parse_binary_facet, triangle_count as usize)(input)
}

fn parse_binary_facet(input: &[u8]) -> IResult<&[u8], Facet> {
    let (input, normal) = parse_binary_vector3(input)?;
    let (input, v0) = parse_binary_vector3(input)?;
    let (input, v1) = parse_binary_vector3(input)?;
    let (input, v2) = parse_binary_vector3(input)?;
    // Attribute byte count
    let (input, _) = take(2usize)(input)?;

    Ok((
        input,
        Facet {
            normal,
            vertices: [v0.into(), v1.into(), v2.into()],
        },
    ))
}

fn parse_binary_vector3(input: &[u8]) -> IResult<&[u8], Vector3<f32>> {
    let (input, x) = le_f32(input)?;
    let (input, y) = le_f32(input)?;
    let (input, z) = le_f32(input)?;
    Ok((input, Vector3::new(x, y, z)))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Vec<Facet>, ImportError> {
    match parse_ascii_stl_impl(input) {
        Ok((_, facets)) => Ok(facets),
        Err(e) => Err(ImportError::Parse(format!("ASCII STL: {:?}", e))),
    }
}

fn parse_ascii_stl_impl(input: &str) -> IResult<&str, Vec<Facet>> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _) = not_line_ending(input)?; // Optional name
    let (input, facets) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    let (input, _) = opt(not_line_ending)(input)?;
    Ok((input, facets))
}

fn parse_facet(input: &str) -> IResult<&str, Facet> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = parse_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = parse_vertex(input)?;
    let (input, v2) = parse_vertex(input)?;
    let (input, v3) = parse_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((
        input,
        Facet {
            normal,
            vertices: [v1.into(), v2.into(), v3.into()],
        },
    ))
}

fn parse_vertex(input: &str) -> IResult<&str, Vector3<f32>> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    parse_vector3(input)
}

fn parse_vector3(input: &str) -> IResult<&str, Vector3<f32>> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, Vector3::new(x, y, z)))
}

/// Detect and parse STL file (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<Vec<Facet>, ImportError> {
    let text = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    let start = text
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(text.len());
    let text = &text[start..];

    // Binary files may also start with "solid", so fall back on failure
    if text.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(text) {
            if let Ok(facets) = parse_ascii_stl(text) {
                return Ok(facets);
            }
        }
    }

    parse_binary_stl(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneGraph;

    const ASCII_TRIANGLE: &str = "solid tri
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
endsolid tri
";

    fn binary_stl(facets: &[([f32; 3], [[f32; 3]; 3])]) -> Vec<u8> {
        let mut data = vec![0u8; 80];
        data.extend_from_slice(&(facets.len() as u32).to_le_bytes());
        for (normal, vertices) in facets {
            for value in normal.iter().chain(vertices.iter().flatten()) {
                data.extend_from_slice(&value.to_le_bytes());
            }
            data.extend_from_slice(&[0, 0]);
        }
        data
    }

    #[test]
    fn test_parse_binary_header() {
        let mut data = vec![0u8; 84];
        // Set triangle count to 0
        data[80..84].copy_from_slice(&0u32.to_le_bytes());

        let facets = parse_binary_stl(&data).unwrap();
        assert!(facets.is_empty());
    }

    #[test]
    fn test_parse_binary_facets() {
        let data = binary_stl(&[
            ([0.0, 0.0, 1.0], [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
            ([0.0, 0.0, -1.0], [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]]),
        ]);

        let facets = parse_stl(&data).unwrap();
        assert_eq!(facets.len(), 2);
        assert_eq!(facets[1].normal, Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(facets[1].vertices[2], Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_binary_too_small() {
        assert!(matches!(
            parse_binary_stl(&[0u8; 10]),
            Err(ImportError::Truncated { expected: 84, actual: 10 })
        ));
    }

    #[test]
    fn test_binary_truncated_facets() {
        let mut data = binary_stl(&[([0.0; 3], [[0.0; 3]; 3])]);
        data.truncate(100);
        assert!(matches!(
            parse_binary_stl(&data),
            Err(ImportError::Truncated { expected: 134, actual: 100 })
        ));
    }

    #[test]
    fn test_parse_ascii() {
        let facets = parse_stl(ASCII_TRIANGLE.as_bytes()).unwrap();
        assert_eq!(facets.len(), 1);
        assert_eq!(facets[0].normal, Vector3::z());
        assert_eq!(facets[0].vertices[1], Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_parse_ascii_with_bom_and_leading_whitespace() {
        let mut data = b"\xEF\xBB\xBF\n  \t".to_vec();
        data.extend_from_slice(ASCII_TRIANGLE.as_bytes());
        let facets = parse_stl(&data).unwrap();
        assert_eq!(facets.len(), 1);
        assert_eq!(facets[0].normal, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_binary_starting_with_solid() {
        let mut data = binary_stl(&[([0.0, 1.0, 0.0], [[0.0; 3], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]])]);
        data[..5].copy_from_slice(b"solid");

        let facets = parse_stl(&data).unwrap();
        assert_eq!(facets.len(), 1);
        assert_eq!(facets[0].normal, Vector3::y());
    }

    #[test]
    fn test_import_builds_single_mesh_scene() {
        let scene = StlImporter.parse(ASCII_TRIANGLE.as_bytes()).unwrap();
        assert_eq!(scene.node_meshes(0), Some(&[0][..]));
        assert!(scene.node_children(0).is_some_and(|c| c.is_empty()));

        let mesh = scene.mesh(0).unwrap();
        assert_eq!(mesh.positions.len(), 3);
        assert_eq!(mesh.faces, &[vec![0, 1, 2]]);
        assert_eq!(mesh.normals, Some(&[Vector3::z(); 3][..]));
    }

    #[test]
    fn test_zero_normals_dropped() {
        let facets = [Facet {
            normal: Vector3::zeros(),
            vertices: [Point3::origin(); 3],
        }];
        assert!(facets_to_mesh(&facets).normals.is_none());
    }
}
