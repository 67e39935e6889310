//! Type resolution over operand descriptors
//!
//! Given descriptors of the operands and an operation, these functions
//! compute the descriptor of the result together with the kind of node
//! that represents it, or [`Resolved::Invalid`] when the combination is
//! not supported. Operators consult the resolution before building a node.
//!
//! Resolution first promotes the element kinds and then applies the
//! storage legality rules; zero-sized operands are not special.

use crate::traits::element::{Element, ElementKind};
use crate::traits::matrix::{Density, Matrix};
use crate::traits::order::{Order, StorageOrder, TransposeFlag};
use crate::traits::vector::Vector;

/// Kind and element type of an operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperandDescriptor {
    /// A numeric scalar
    Scalar(ElementKind),
    /// Any non-numeric value used in scalar position
    NonNumeric,
    Vector {
        density: Density,
        transposed: bool,
        element: ElementKind,
    },
    Matrix {
        density: Density,
        order: Order,
        element: ElementKind,
    },
}

impl OperandDescriptor {
    pub const fn scalar(element: ElementKind) -> Self {
        OperandDescriptor::Scalar(element)
    }

    pub const fn dense_vector(transposed: bool, element: ElementKind) -> Self {
        OperandDescriptor::Vector {
            density: Density::Dense,
            transposed,
            element,
        }
    }

    pub const fn sparse_vector(transposed: bool, element: ElementKind) -> Self {
        OperandDescriptor::Vector {
            density: Density::Sparse,
            transposed,
            element,
        }
    }

    pub const fn dense_matrix(order: Order, element: ElementKind) -> Self {
        OperandDescriptor::Matrix {
            density: Density::Dense,
            order,
            element,
        }
    }

    pub const fn sparse_matrix(order: Order, element: ElementKind) -> Self {
        OperandDescriptor::Matrix {
            density: Density::Sparse,
            order,
            element,
        }
    }

    /// Descriptor of a matrix type
    pub const fn of_matrix<M: Matrix + ?Sized>() -> Self {
        let order = if M::Order::IS_ROW_MAJOR {
            Order::RowMajor
        } else {
            Order::ColumnMajor
        };
        OperandDescriptor::Matrix {
            density: M::DENSITY,
            order,
            element: <M::Element as Element>::KIND,
        }
    }

    /// Descriptor of a vector type
    pub const fn of_vector<V: Vector + ?Sized>() -> Self {
        OperandDescriptor::Vector {
            density: V::DENSITY,
            transposed: V::Transpose::IS_TRANSPOSED,
            element: <V::Element as Element>::KIND,
        }
    }

    /// Descriptor of a scalar type
    pub const fn of_scalar<T: Element>() -> Self {
        OperandDescriptor::Scalar(T::KIND)
    }

    pub const fn element(self) -> Option<ElementKind> {
        match self {
            OperandDescriptor::Scalar(e) => Some(e),
            OperandDescriptor::NonNumeric => None,
            OperandDescriptor::Vector { element, .. } | OperandDescriptor::Matrix { element, .. } => {
                Some(element)
            }
        }
    }

    /// Same descriptor with another element kind
    const fn with_element(self, kind: ElementKind) -> Self {
        match self {
            OperandDescriptor::Scalar(_) => OperandDescriptor::Scalar(kind),
            OperandDescriptor::NonNumeric => OperandDescriptor::NonNumeric,
            OperandDescriptor::Vector {
                density,
                transposed,
                ..
            } => OperandDescriptor::Vector {
                density,
                transposed,
                element: kind,
            },
            OperandDescriptor::Matrix { density, order, .. } => OperandDescriptor::Matrix {
                density,
                order,
                element: kind,
            },
        }
    }

    const fn is_container(self) -> bool {
        matches!(
            self,
            OperandDescriptor::Vector { .. } | OperandDescriptor::Matrix { .. }
        )
    }
}

/// Binary operations known to the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operation {
    Add,
    Sub,
    Schur,
    Mult,
    Div,
}

/// Expression node chosen to represent a resolved operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    Sum,
    Difference,
    SchurProduct,
    Product,
    InnerProduct,
    OuterProduct,
    Componentwise,
    ScalarMult,
    ScalarDiv,
}

/// Outcome of a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Resolved {
    /// Unsupported combination
    Invalid,
    Valid {
        result: OperandDescriptor,
        node: NodeKind,
    },
}

impl Resolved {
    pub const fn is_valid(self) -> bool {
        matches!(self, Resolved::Valid { .. })
    }

    pub const fn result(self) -> Option<OperandDescriptor> {
        match self {
            Resolved::Valid { result, .. } => Some(result),
            Resolved::Invalid => None,
        }
    }

    pub const fn node(self) -> Option<NodeKind> {
        match self {
            Resolved::Valid { node, .. } => Some(node),
            Resolved::Invalid => None,
        }
    }

    const fn valid(result: OperandDescriptor, node: NodeKind) -> Resolved {
        Resolved::Valid { result, node }
    }
}

const fn sparse_if(sparse: bool) -> Density {
    if sparse {
        Density::Sparse
    } else {
        Density::Dense
    }
}

const fn is_sparse(density: Density) -> bool {
    matches!(density, Density::Sparse)
}

/// Node kind of a division by a scalar of promoted kind `kind`
///
/// Real floating point divisions become multiplications by the reciprocal.
pub const fn scalar_division_node(kind: ElementKind) -> NodeKind {
    if kind.is_floating_point() {
        NodeKind::ScalarMult
    } else {
        NodeKind::ScalarDiv
    }
}

/// Resolve `lhs op rhs`
pub const fn resolve(op: Operation, lhs: OperandDescriptor, rhs: OperandDescriptor) -> Resolved {
    let element = match (lhs.element(), rhs.element()) {
        (Some(a), Some(b)) => a.promote(b),
        _ => return Resolved::Invalid,
    };

    match op {
        Operation::Add | Operation::Sub => {
            let node = if matches!(op, Operation::Add) {
                NodeKind::Sum
            } else {
                NodeKind::Difference
            };
            match (lhs, rhs) {
                (
                    OperandDescriptor::Matrix {
                        density: d1,
                        order: o1,
                        ..
                    },
                    OperandDescriptor::Matrix {
                        density: d2,
                        order: o2,
                        ..
                    },
                ) => {
                    let sparse = is_sparse(d1) && is_sparse(d2);
                    let order = if !sparse && is_sparse(d1) { o2 } else { o1 };
                    Resolved::valid(
                        OperandDescriptor::Matrix {
                            density: sparse_if(sparse),
                            order,
                            element,
                        },
                        node,
                    )
                }
                (
                    OperandDescriptor::Vector {
                        density: d1,
                        transposed: t1,
                        ..
                    },
                    OperandDescriptor::Vector {
                        density: d2,
                        transposed: t2,
                        ..
                    },
                ) => {
                    if t1 != t2 {
                        return Resolved::Invalid;
                    }
                    Resolved::valid(
                        OperandDescriptor::Vector {
                            density: sparse_if(is_sparse(d1) && is_sparse(d2)),
                            transposed: t1,
                            element,
                        },
                        node,
                    )
                }
                _ => Resolved::Invalid,
            }
        }
        Operation::Schur => match (lhs, rhs) {
            (
                OperandDescriptor::Matrix {
                    density: d1,
                    order: o1,
                    ..
                },
                OperandDescriptor::Matrix {
                    density: d2,
                    order: o2,
                    ..
                },
            ) => {
                let order = if is_sparse(d2) && !is_sparse(d1) { o2 } else { o1 };
                Resolved::valid(
                    OperandDescriptor::Matrix {
                        density: sparse_if(is_sparse(d1) || is_sparse(d2)),
                        order,
                        element,
                    },
                    NodeKind::SchurProduct,
                )
            }
            _ => Resolved::Invalid,
        },
        Operation::Mult => resolve_mult(lhs, rhs, element),
        Operation::Div => match (lhs, rhs) {
            (container, OperandDescriptor::Scalar(_)) if container.is_container() => Resolved::valid(
                container.with_element(element),
                scalar_division_node(element),
            ),
            (
                OperandDescriptor::Vector {
                    density: d1,
                    transposed: t1,
                    ..
                },
                OperandDescriptor::Vector { transposed: t2, .. },
            ) => {
                if t1 != t2 {
                    return Resolved::Invalid;
                }
                Resolved::valid(
                    OperandDescriptor::Vector {
                        density: d1,
                        transposed: t1,
                        element,
                    },
                    NodeKind::Componentwise,
                )
            }
            _ => Resolved::Invalid,
        },
    }
}

const fn resolve_mult(lhs: OperandDescriptor, rhs: OperandDescriptor, element: ElementKind) -> Resolved {
    match (lhs, rhs) {
        (OperandDescriptor::Scalar(_), container) | (container, OperandDescriptor::Scalar(_))
            if container.is_container() =>
        {
            Resolved::valid(container.with_element(element), NodeKind::ScalarMult)
        }
        (
            OperandDescriptor::Matrix {
                density: d1,
                order: o1,
                ..
            },
            OperandDescriptor::Matrix {
                density: d2,
                order: o2,
                ..
            },
        ) => {
            let sparse = is_sparse(d1) && is_sparse(d2);
            let order = if !sparse && is_sparse(d1) { o2 } else { o1 };
            Resolved::valid(
                OperandDescriptor::Matrix {
                    density: sparse_if(sparse),
                    order,
                    element,
                },
                NodeKind::Product,
            )
        }
        (
            OperandDescriptor::Matrix { density: d1, .. },
            OperandDescriptor::Vector {
                density: d2,
                transposed: false,
                ..
            },
        ) => Resolved::valid(
            OperandDescriptor::Vector {
                density: sparse_if(is_sparse(d1) && is_sparse(d2)),
                transposed: false,
                element,
            },
            NodeKind::Product,
        ),
        (
            OperandDescriptor::Vector {
                density: d1,
                transposed: true,
                ..
            },
            OperandDescriptor::Matrix { density: d2, .. },
        ) => Resolved::valid(
            OperandDescriptor::Vector {
                density: sparse_if(is_sparse(d1) && is_sparse(d2)),
                transposed: true,
                element,
            },
            NodeKind::Product,
        ),
        (
            OperandDescriptor::Vector {
                density: d1,
                transposed: t1,
                ..
            },
            OperandDescriptor::Vector {
                density: d2,
                transposed: t2,
                ..
            },
        ) => {
            if t1 && !t2 {
                Resolved::valid(OperandDescriptor::Scalar(element), NodeKind::InnerProduct)
            } else if !t1 && t2 {
                Resolved::valid(
                    OperandDescriptor::Matrix {
                        density: sparse_if(is_sparse(d1) && is_sparse(d2)),
                        order: Order::RowMajor,
                        element,
                    },
                    NodeKind::OuterProduct,
                )
            } else {
                Resolved::valid(
                    OperandDescriptor::Vector {
                        density: sparse_if(is_sparse(d1) || is_sparse(d2)),
                        transposed: t1,
                        element,
                    },
                    NodeKind::Componentwise,
                )
            }
        }
        _ => Resolved::Invalid,
    }
}

/// Dense row-major matrix times numeric scalar
pub const fn dmat_scalar_mult_trait(m: OperandDescriptor, s: OperandDescriptor) -> Resolved {
    match (m, s) {
        (
            OperandDescriptor::Matrix {
                density: Density::Dense,
                order: Order::RowMajor,
                ..
            },
            OperandDescriptor::Scalar(_),
        ) => resolve(Operation::Mult, m, s),
        _ => Resolved::Invalid,
    }
}

/// Sparse non-transposed vector divided by numeric scalar
pub const fn svec_scalar_div_trait(v: OperandDescriptor, s: OperandDescriptor) -> Resolved {
    match (v, s) {
        (
            OperandDescriptor::Vector {
                density: Density::Sparse,
                transposed: false,
                ..
            },
            OperandDescriptor::Scalar(_),
        ) => resolve(Operation::Div, v, s),
        _ => Resolved::Invalid,
    }
}

/// Sum of two sparse row-major matrices
pub const fn smat_smat_add_trait(a: OperandDescriptor, b: OperandDescriptor) -> Resolved {
    match (a, b) {
        (
            OperandDescriptor::Matrix {
                density: Density::Sparse,
                order: Order::RowMajor,
                ..
            },
            OperandDescriptor::Matrix {
                density: Density::Sparse,
                order: Order::RowMajor,
                ..
            },
        ) => resolve(Operation::Add, a, b),
        _ => Resolved::Invalid,
    }
}

/// Transposed dense vector times non-transposed sparse vector (inner product)
pub const fn tdvec_svec_mult_trait(a: OperandDescriptor, b: OperandDescriptor) -> Resolved {
    match (a, b) {
        (
            OperandDescriptor::Vector {
                density: Density::Dense,
                transposed: true,
                ..
            },
            OperandDescriptor::Vector {
                density: Density::Sparse,
                transposed: false,
                ..
            },
        ) => resolve(Operation::Mult, a, b),
        _ => Resolved::Invalid,
    }
}

/// Transposed sparse vector times column-major dense matrix
pub const fn tsvec_tdmat_mult_trait(v: OperandDescriptor, m: OperandDescriptor) -> Resolved {
    match (v, m) {
        (
            OperandDescriptor::Vector {
                density: Density::Sparse,
                transposed: true,
                ..
            },
            OperandDescriptor::Matrix {
                density: Density::Dense,
                order: Order::ColumnMajor,
                ..
            },
        ) => resolve(Operation::Mult, v, m),
        _ => Resolved::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DROW_F64: OperandDescriptor = OperandDescriptor::dense_matrix(Order::RowMajor, ElementKind::F64);
    const DCOL_F64: OperandDescriptor =
        OperandDescriptor::dense_matrix(Order::ColumnMajor, ElementKind::F64);
    const SCOL_I32: OperandDescriptor =
        OperandDescriptor::sparse_matrix(Order::ColumnMajor, ElementKind::I32);
    const SROW_F32: OperandDescriptor = OperandDescriptor::sparse_matrix(Order::RowMajor, ElementKind::F32);

    #[test]
    fn test_dmat_scalar_mult_trait() {
        let r = dmat_scalar_mult_trait(DROW_F64, OperandDescriptor::scalar(ElementKind::I32));
        assert_eq!(
            r,
            Resolved::Valid {
                result: DROW_F64,
                node: NodeKind::ScalarMult
            }
        );
        assert_eq!(
            dmat_scalar_mult_trait(DCOL_F64, OperandDescriptor::scalar(ElementKind::F64)),
            Resolved::Invalid
        );
        assert_eq!(
            dmat_scalar_mult_trait(DROW_F64, OperandDescriptor::NonNumeric),
            Resolved::Invalid
        );
        assert_eq!(dmat_scalar_mult_trait(SROW_F32, OperandDescriptor::scalar(ElementKind::F32)), Resolved::Invalid);
    }

    #[test]
    fn test_svec_scalar_div_prefers_reciprocal() {
        let v = OperandDescriptor::sparse_vector(false, ElementKind::I32);
        let by_float = svec_scalar_div_trait(v, OperandDescriptor::scalar(ElementKind::F64));
        assert_eq!(by_float.node(), Some(NodeKind::ScalarMult));
        assert_eq!(
            by_float.result(),
            Some(OperandDescriptor::sparse_vector(false, ElementKind::F64))
        );

        let by_int = svec_scalar_div_trait(v, OperandDescriptor::scalar(ElementKind::I32));
        assert_eq!(by_int.node(), Some(NodeKind::ScalarDiv));

        let complex = OperandDescriptor::sparse_vector(false, ElementKind::C64);
        assert_eq!(
            svec_scalar_div_trait(complex, OperandDescriptor::scalar(ElementKind::F64)).node(),
            Some(NodeKind::ScalarDiv)
        );

        let transposed = OperandDescriptor::sparse_vector(true, ElementKind::F64);
        assert!(!svec_scalar_div_trait(transposed, OperandDescriptor::scalar(ElementKind::F64)).is_valid());
        let dense = OperandDescriptor::dense_vector(false, ElementKind::F64);
        assert!(!svec_scalar_div_trait(dense, OperandDescriptor::scalar(ElementKind::F64)).is_valid());
    }

    #[test]
    fn test_smat_smat_add_trait() {
        let r = smat_smat_add_trait(SROW_F32, SROW_F32);
        assert_eq!(r.result(), Some(SROW_F32));
        assert!(!smat_smat_add_trait(SROW_F32, SCOL_I32).is_valid());
        assert!(!smat_smat_add_trait(SROW_F32, DROW_F64).is_valid());
    }

    #[test]
    fn test_vector_products() {
        let tdvec = OperandDescriptor::dense_vector(true, ElementKind::I32);
        let svec = OperandDescriptor::sparse_vector(false, ElementKind::F64);
        assert_eq!(
            tdvec_svec_mult_trait(tdvec, svec).result(),
            Some(OperandDescriptor::scalar(ElementKind::F64))
        );
        assert!(!tdvec_svec_mult_trait(svec, tdvec).is_valid());

        let tsvec = OperandDescriptor::sparse_vector(true, ElementKind::F64);
        assert_eq!(
            tsvec_tdmat_mult_trait(tsvec, DCOL_F64).result(),
            Some(OperandDescriptor::dense_vector(true, ElementKind::F64))
        );
        assert!(!tsvec_tdmat_mult_trait(tsvec, DROW_F64).is_valid());
    }

    #[test]
    fn test_general_resolution() {
        // sparse x dense takes the dense operand's order
        let r = resolve(Operation::Mult, SCOL_I32, DROW_F64);
        assert_eq!(r.result(), Some(DROW_F64));
        assert_eq!(r.node(), Some(NodeKind::Product));

        let dvec = OperandDescriptor::dense_vector(false, ElementKind::F64);
        let tdvec = OperandDescriptor::dense_vector(true, ElementKind::F64);
        assert!(!resolve(Operation::Add, dvec, tdvec).is_valid());
        assert!(!resolve(Operation::Add, dvec, DROW_F64).is_valid());
        assert!(!resolve(Operation::Schur, dvec, dvec).is_valid());
        assert_eq!(resolve(Operation::Mult, dvec, tdvec).node(), Some(NodeKind::OuterProduct));
        assert!(resolve(Operation::Mult, tdvec, DROW_F64.with_element(ElementKind::I32)).is_valid());
        assert!(!resolve(Operation::Mult, dvec, DROW_F64).is_valid());
        assert!(!resolve(Operation::Add, OperandDescriptor::NonNumeric, dvec).is_valid());
        assert!(!resolve(Operation::Div, OperandDescriptor::scalar(ElementKind::F64), dvec).is_valid());
    }
}
