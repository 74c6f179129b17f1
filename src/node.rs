use crate::{
    common::{pairs_from_points, points_from_pairs, MasterValues, Point},
    convertors::vfb::records::NodeRecord,
    FakeLabError,
};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum NodeType {
    /// Starts a contour
    Move,
    Line,
    /// A cubic curve: two control points, then the on-curve point
    Curve,
    /// A quadratic off-curve point
    Off,
}

impl NodeType {
    /// Number of points each master holds for a node of this type.
    pub fn points_per_master(self) -> usize {
        match self {
            NodeType::Curve => 3,
            NodeType::Move | NodeType::Line | NodeType::Off => 1,
        }
    }

    /// The node type constant used by the scripting API.
    pub fn api_code(self) -> i32 {
        match self {
            NodeType::Move => 17,
            NodeType::Line => 1,
            NodeType::Curve => 35,
            NodeType::Off => 65,
        }
    }

    pub(crate) fn vfb_code(self) -> u8 {
        match self {
            NodeType::Move => 0,
            NodeType::Line => 1,
            NodeType::Curve => 3,
            NodeType::Off => 4,
        }
    }

    pub(crate) fn from_vfb_code(code: u8) -> Option<NodeType> {
        match code {
            0 => Some(NodeType::Move),
            1 => Some(NodeType::Line),
            3 => Some(NodeType::Curve),
            4 => Some(NodeType::Off),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Hash)]
pub enum Alignment {
    #[default]
    Sharp,
    Smooth,
    Fixed,
}

impl Alignment {
    pub fn api_code(self) -> i32 {
        match self {
            Alignment::Sharp => 0,
            Alignment::Smooth => 4096,
            Alignment::Fixed => 12288,
        }
    }

    pub(crate) fn flags(self) -> u8 {
        match self {
            Alignment::Sharp => 0,
            Alignment::Smooth => 1,
            Alignment::Fixed => 3,
        }
    }

    pub(crate) fn from_flags(flags: u8) -> Alignment {
        match flags & 3 {
            3 => Alignment::Fixed,
            1 => Alignment::Smooth,
            _ => Alignment::Sharp,
        }
    }
}

/// An outline node.
///
/// Each node holds one or three points, and each point varies per master.
/// The on-curve point is always the last one.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub nodetype: NodeType,
    pub alignment: Alignment,
    pub selected: bool,
    points: Vec<MasterValues<Point>>,
}

impl Node {
    /// Creates a single-master node, validating the point count.
    pub fn new(nodetype: NodeType, points: &[Point]) -> Result<Node, FakeLabError> {
        Node::from_masters(nodetype, &[points.to_vec()])
    }

    /// Creates a node from per-master point lists: `points[master][k]`.
    pub fn from_masters(nodetype: NodeType, points: &[Vec<Point>]) -> Result<Node, FakeLabError> {
        let expected = nodetype.points_per_master();
        if points.is_empty() {
            return Err(FakeLabError::NodePointCount {
                nodetype,
                expected,
                found: 0,
                master: 0,
            });
        }
        for (master, master_points) in points.iter().enumerate() {
            if master_points.len() != expected {
                return Err(FakeLabError::NodePointCount {
                    nodetype,
                    expected,
                    found: master_points.len(),
                    master,
                });
            }
        }
        let per_point = (0..expected)
            .map(|k| {
                let column: Vec<Point> = points.iter().map(|m| m[k]).collect();
                MasterValues::from_live(&column)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Node {
            nodetype,
            alignment: Alignment::default(),
            selected: false,
            points: per_point,
        })
    }

    pub fn move_to(p: Point) -> Node {
        Node::single(NodeType::Move, p)
    }

    pub fn line_to(p: Point) -> Node {
        Node::single(NodeType::Line, p)
    }

    pub fn off(p: Point) -> Node {
        Node::single(NodeType::Off, p)
    }

    pub fn curve_to(c1: Point, c2: Point, p: Point) -> Node {
        Node {
            nodetype: NodeType::Curve,
            alignment: Alignment::default(),
            selected: false,
            points: vec![
                MasterValues::splat(c1),
                MasterValues::splat(c2),
                MasterValues::splat(p),
            ],
        }
    }

    fn single(nodetype: NodeType, p: Point) -> Node {
        Node {
            nodetype,
            alignment: Alignment::default(),
            selected: false,
            points: vec![MasterValues::splat(p)],
        }
    }

    pub fn count(&self) -> usize {
        self.points.len()
    }

    pub fn layers_number(&self) -> usize {
        self.points.first().map(|p| p.count()).unwrap_or(1)
    }

    /// The on-curve point in the first master.
    pub fn point(&self) -> Point {
        self.points.last().map(|p| *p.get()).unwrap_or_default()
    }

    pub fn x(&self) -> i32 {
        self.point().x
    }

    pub fn y(&self) -> i32 {
        self.point().y
    }

    /// Moves the on-curve point in every master.
    pub fn set_point(&mut self, p: Point) {
        if let Some(last) = self.points.last_mut() {
            last.set(p);
        }
    }

    pub fn point_at(&self, master: usize) -> Option<Point> {
        self.points.last().and_then(|p| p.at(master)).copied()
    }

    pub fn set_point_at(&mut self, master: usize, p: Point) -> Result<(), FakeLabError> {
        match self.points.last_mut() {
            Some(last) => last.set_at(master, p),
            None => Ok(()),
        }
    }

    /// All points of this node in one master, control points first.
    pub fn points_at(&self, master: usize) -> Vec<Point> {
        self.points
            .iter()
            .filter_map(|p| p.at(master).copied())
            .collect()
    }

    pub fn points(&self) -> &[MasterValues<Point>] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [MasterValues<Point>] {
        &mut self.points
    }

    pub(crate) fn set_layers_number(&mut self, count: usize) -> Result<(), FakeLabError> {
        for p in self.points.iter_mut() {
            p.set_count(count)?;
        }
        Ok(())
    }

    pub(crate) fn add_axis(&mut self) -> Result<(), FakeLabError> {
        for p in self.points.iter_mut() {
            p.add_axis()?;
        }
        Ok(())
    }

    pub(crate) fn remove_axis(&mut self, axis: usize, factor: f64) -> Result<(), FakeLabError> {
        for p in self.points.iter_mut() {
            p.remove_axis_at(axis, factor)?;
        }
        Ok(())
    }

    pub fn shift(&mut self, delta: Point) {
        for p in self.points.iter_mut() {
            for slot in p.iter_mut() {
                *slot = *slot + delta;
            }
        }
    }

    pub fn serialize(&self) -> NodeRecord {
        let masters = self.layers_number();
        NodeRecord {
            nodetype: self.nodetype.vfb_code(),
            flags: self.alignment.flags(),
            points: (0..masters)
                .map(|m| pairs_from_points(&self.points_at(m)))
                .collect(),
        }
    }

    /// Rebuilds a node, enforcing the per-type point count in every master.
    pub fn deserialize(record: &NodeRecord) -> Result<Node, FakeLabError> {
        let nodetype = NodeType::from_vfb_code(record.nodetype).ok_or_else(|| {
            FakeLabError::General(format!("Unknown node type {}", record.nodetype))
        })?;
        let per_master: Vec<Vec<Point>> = record
            .points
            .iter()
            .map(|m| points_from_pairs(m))
            .collect();
        let mut node = Node::from_masters(nodetype, &per_master)?;
        node.alignment = Alignment::from_flags(record.flags);
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_curve_final_point() {
        let node = Node::curve_to(Point::new(0, 10), Point::new(5, 20), Point::new(30, 30));
        assert_eq!(node.point(), Point::new(30, 30));
        assert_eq!(node.x(), 30);
        assert_eq!(node.count(), 3);
    }

    #[rstest]
    #[case(NodeType::Curve, 1)]
    #[case(NodeType::Curve, 2)]
    #[case(NodeType::Line, 3)]
    #[case(NodeType::Move, 0)]
    #[case(NodeType::Off, 2)]
    fn test_point_count_rejected(#[case] nodetype: NodeType, #[case] count: usize) {
        let points = vec![Point::new(1, 1); count];
        assert!(matches!(
            Node::new(nodetype, &points),
            Err(FakeLabError::NodePointCount { .. })
        ));
    }

    #[test]
    fn test_deserialize_checks_every_master() {
        let record = NodeRecord {
            nodetype: 3,
            flags: 0,
            points: vec![
                vec![(0, 0), (1, 1), (2, 2)],
                vec![(0, 0), (2, 2)],
            ],
        };
        match Node::deserialize(&record) {
            Err(FakeLabError::NodePointCount {
                expected,
                found,
                master,
                ..
            }) => {
                assert_eq!((expected, found, master), (3, 2, 1));
            }
            other => panic!("Expected a point count error, got {:?}", other),
        }
    }

    #[test]
    fn test_serialize_masters() {
        let node = Node::from_masters(
            NodeType::Line,
            &[vec![Point::new(1, 2)], vec![Point::new(3, 4)]],
        )
        .unwrap();
        let record = node.serialize();
        assert_eq!(record.points, vec![vec![(1, 2)], vec![(3, 4)]]);
        assert_eq!(Node::deserialize(&record).unwrap(), node);
    }

    #[test]
    fn test_broadcast_point() {
        let mut node = Node::from_masters(
            NodeType::Line,
            &[vec![Point::new(1, 2)], vec![Point::new(3, 4)]],
        )
        .unwrap();
        node.set_point(Point::new(9, 9));
        assert_eq!(node.point_at(1), Some(Point::new(9, 9)));
        node.set_point_at(1, Point::new(0, 0)).unwrap();
        assert_eq!(node.point(), Point::new(9, 9));
        assert_eq!(node.point_at(1), Some(Point::new(0, 0)));
    }
}
