use nalgebra::{Point3, Vector3};

/// Number of three-dimensional points needed to hold `num_args` coordinates.
#[inline]
pub fn point_count(num_args: usize) -> usize {
    num_args.div_ceil(3)
}

/// Groups every three consecutive arguments into one point.
///
/// The buffer is resized to [`point_count`] points. Coordinates beyond the end of
/// `args` are zero, so a trailing partial point is completed with zeros.
pub fn pack_points(args: &[f64], points: &mut Vec<Point3<f64>>) {
    points.clear();
    points.extend(args.chunks(3).map(|chunk| {
        let mut point = Point3::origin();
        for (axis, &value) in chunk.iter().enumerate() {
            point[axis] = value;
        }
        point
    }));
}

/// Builds `N` points from a flat `[x1, y1, z1, x2, ...]` slice of exactly `3 * N` values.
#[inline]
pub fn points_from_flat<const N: usize>(coords: &[f64]) -> [Point3<f64>; N] {
    debug_assert_eq!(coords.len(), 3 * N);
    std::array::from_fn(|i| Point3::new(coords[3 * i], coords[3 * i + 1], coords[3 * i + 2]))
}

/// Writes per-point gradient vectors into a flat `[dx1, dy1, dz1, dx2, ...]` slice.
#[inline]
pub fn flatten_gradient(gradient: &[Vector3<f64>], out: &mut [f64]) {
    for (chunk, g) in out.chunks_mut(3).zip(gradient) {
        chunk.copy_from_slice(g.as_slice());
    }
}

#[inline]
pub fn distance(points: &[Point3<f64>; 2]) -> f64 {
    (points[0] - points[1]).norm()
}

/// Gradient of [`distance`] with respect to each point. Zero for coincident points.
pub fn distance_gradient(points: &[Point3<f64>; 2]) -> [Vector3<f64>; 2] {
    let delta = points[0] - points[1];
    let r = delta.norm();
    if r == 0.0 {
        return [Vector3::zeros(); 2];
    }
    let g = delta / r;
    [g, -g]
}

/// Angle formed at the middle point, in radians within `[0, pi]`.
pub fn angle(points: &[Point3<f64>; 3]) -> f64 {
    let u = points[0] - points[1];
    let v = points[2] - points[1];
    u.angle(&v)
}

/// Gradient of [`angle`] with respect to each point.
///
/// The gradient is undefined for collinear or coincident points; zero is returned there.
pub fn angle_gradient(points: &[Point3<f64>; 3]) -> [Vector3<f64>; 3] {
    let u = points[0] - points[1];
    let v = points[2] - points[1];
    let w_u = u.cross(&u.cross(&v));
    let w_v = v.cross(&v.cross(&u));
    let (nu, nv, nwu, nwv) = (u.norm(), v.norm(), w_u.norm(), w_v.norm());
    if nu == 0.0 || nv == 0.0 || nwu == 0.0 || nwv == 0.0 {
        return [Vector3::zeros(); 3];
    }
    let g_first = w_u / (nwu * nu);
    let g_last = w_v / (nwv * nv);
    [g_first, -(g_first + g_last), g_last]
}

/// Dihedral angle defined by four points, in radians within `[-pi, pi]`.
pub fn dihedral(points: &[Point3<f64>; 4]) -> f64 {
    let b1 = points[1] - points[0];
    let b2 = points[2] - points[1];
    let b3 = points[3] - points[2];
    let n1 = b1.cross(&b2);
    let n2 = b2.cross(&b3);
    (b2.norm() * b1.dot(&n2)).atan2(n1.dot(&n2))
}

/// Gradient of [`dihedral`] with respect to each point.
///
/// Zero when either of the two planes is degenerate.
pub fn dihedral_gradient(points: &[Point3<f64>; 4]) -> [Vector3<f64>; 4] {
    let b1 = points[1] - points[0];
    let b2 = points[2] - points[1];
    let b3 = points[3] - points[2];
    let n1 = b1.cross(&b2);
    let n2 = b2.cross(&b3);
    let (n1_sq, n2_sq, b2_sq) = (n1.norm_squared(), n2.norm_squared(), b2.norm_squared());
    if n1_sq == 0.0 || n2_sq == 0.0 || b2_sq == 0.0 {
        return [Vector3::zeros(); 4];
    }
    let b2_norm = b2_sq.sqrt();

    let g1 = n1 * (-b2_norm / n1_sq);
    let g4 = n2 * (b2_norm / n2_sq);
    let g2 = g1 * -(1.0 + b1.dot(&b2) / b2_sq) + g4 * (b3.dot(&b2) / b2_sq);
    let g3 = -(g1 + g2 + g4);
    [g1, g2, g3, g4]
}
