//! Read-only view over the contact network.

use crate::error::{Result, SimulationError};

/// Undirected contact network stored as ascending adjacency lists.
///
/// Immutable once built; wrap it in an `Arc` to share it between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactNetwork {
    adjacency: Vec<Vec<usize>>,
}

impl ContactNetwork {
    /// Builds the network from an N×N 0/1 adjacency matrix.
    ///
    /// # Errors
    ///
    /// - `SimulationError::InvalidParameter` - Matrix is empty, not square, has entries other
    ///   than 0 and 1, is asymmetric, or contains a self-loop
    pub fn from_adjacency(matrix: &[Vec<u8>]) -> Result<Self> {
        let n = matrix.len();
        if n == 0 {
            return Err(SimulationError::invalid_parameter(
                "adjacency matrix has no nodes",
            ));
        }

        for (row_index, row) in matrix.iter().enumerate() {
            if row.len() != n {
                return Err(SimulationError::invalid_parameter(format!(
                    "adjacency matrix is not square: row {row_index} has {} entries, expected {n}",
                    row.len()
                )));
            }
            if let Some(column) = row.iter().position(|&value| value > 1) {
                return Err(SimulationError::invalid_parameter(format!(
                    "adjacency entry ({row_index}, {column}) is {}, expected 0 or 1",
                    row[column]
                )));
            }
        }

        let mut adjacency = vec![Vec::new(); n];
        for (i, row) in matrix.iter().enumerate() {
            if row[i] == 1 {
                return Err(SimulationError::invalid_parameter(format!(
                    "node {i} has a self-loop"
                )));
            }
            for (j, &value) in row.iter().enumerate() {
                if value != matrix[j][i] {
                    return Err(SimulationError::invalid_parameter(format!(
                        "adjacency matrix is asymmetric at ({i}, {j})"
                    )));
                }
                if value == 1 {
                    adjacency[i].push(j);
                }
            }
        }

        Ok(Self { adjacency })
    }

    /// Builds the network from an undirected edge list over `node_count` nodes.
    ///
    /// Duplicate edges collapse into one.
    ///
    /// # Errors
    ///
    /// - `SimulationError::InvalidParameter` - No nodes, an endpoint is out of range, or an
    ///   edge is a self-loop
    pub fn from_edges(node_count: usize, edges: &[(usize, usize)]) -> Result<Self> {
        if node_count == 0 {
            return Err(SimulationError::invalid_parameter(
                "network has no nodes",
            ));
        }

        let mut adjacency = vec![Vec::new(); node_count];
        for &(a, b) in edges {
            if a >= node_count || b >= node_count {
                return Err(SimulationError::invalid_parameter(format!(
                    "edge ({a}, {b}) references a node outside 0..{node_count}"
                )));
            }
            if a == b {
                return Err(SimulationError::invalid_parameter(format!(
                    "node {a} has a self-loop"
                )));
            }
            adjacency[a].push(b);
            adjacency[b].push(a);
        }

        for neighbors in &mut adjacency {
            neighbors.sort_unstable();
            neighbors.dedup();
        }

        Ok(Self { adjacency })
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// Returns true if the network has no nodes.
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Neighbors of `node` in ascending index order.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.adjacency[node]
    }

    /// Number of neighbors of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is out of range.
    pub fn degree(&self, node: usize) -> usize {
        self.adjacency[node].len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Dense 0/1 matrix form of the network.
    pub fn to_adjacency(&self) -> Vec<Vec<u8>> {
        let n = self.len();
        self.adjacency
            .iter()
            .map(|neighbors| {
                let mut row = vec![0u8; n];
                for &j in neighbors {
                    row[j] = 1;
                }
                row
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_matrix() -> Vec<Vec<u8>> {
        vec![
            vec![0, 1, 0, 0],
            vec![1, 0, 1, 0],
            vec![0, 1, 0, 1],
            vec![0, 0, 1, 0],
        ]
    }

    #[test]
    fn test_neighbors_ascending() {
        let network = ContactNetwork::from_adjacency(&path_matrix()).unwrap();

        assert_eq!(network.len(), 4);
        assert_eq!(network.neighbors(0), &[1]);
        assert_eq!(network.neighbors(1), &[0, 2]);
        assert_eq!(network.neighbors(2), &[1, 3]);
        assert_eq!(network.edge_count(), 3);
        assert_eq!(network.degree(3), 1);
    }

    #[test]
    fn test_rejects_non_square() {
        let matrix = vec![vec![0, 1], vec![1]];
        let result = ContactNetwork::from_adjacency(&matrix);
        assert!(matches!(
            result,
            Err(SimulationError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_rejects_asymmetric() {
        let matrix = vec![vec![0, 1], vec![0, 0]];
        assert!(ContactNetwork::from_adjacency(&matrix).is_err());
    }

    #[test]
    fn test_rejects_non_binary() {
        let matrix = vec![vec![0, 2], vec![2, 0]];
        assert!(ContactNetwork::from_adjacency(&matrix).is_err());
    }

    #[test]
    fn test_rejects_self_loop_and_empty() {
        let matrix = vec![vec![1, 0], vec![0, 0]];
        assert!(ContactNetwork::from_adjacency(&matrix).is_err());
        assert!(ContactNetwork::from_adjacency(&[]).is_err());
    }

    #[test]
    fn test_from_edges_matches_matrix() {
        let from_edges =
            ContactNetwork::from_edges(4, &[(2, 1), (0, 1), (3, 2), (1, 0)]).unwrap();
        let from_matrix = ContactNetwork::from_adjacency(&path_matrix()).unwrap();

        assert_eq!(from_edges, from_matrix);
        assert_eq!(from_edges.to_adjacency(), path_matrix());
    }

    #[test]
    fn test_from_edges_rejects_out_of_range() {
        assert!(ContactNetwork::from_edges(2, &[(0, 2)]).is_err());
        assert!(ContactNetwork::from_edges(2, &[(1, 1)]).is_err());
        assert!(ContactNetwork::from_edges(0, &[]).is_err());
    }
}
