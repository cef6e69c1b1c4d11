use bevy::prelude::*;

/// Hit of a ray against an oriented box, in the box's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxHit {
    pub t: f32,
    pub local_point: Vec3,
    /// Outward normal of the face that was hit, in local space.
    pub local_normal: Vec3,
}

pub fn ray_hits_obb(origin: Vec3, dir: Vec3, xf: Transform, size: Vec3) -> Option<BoxHit> {
    let inv = xf.compute_matrix().inverse();
    let o_local = inv.transform_point3(origin);
    let d_local = inv.transform_vector3(dir);
    let he = size * 0.5;
    let t = ray_aabb_hit_t(o_local, d_local, -he, he)?;
    let local_point = o_local + d_local * t;
    Some(BoxHit {
        t,
        local_point,
        local_normal: face_normal(local_point, he),
    })
}

// Slab-method ray–AABB intersection, returns Some(t) or None
pub fn ray_aabb_hit_t(ray_origin: Vec3, ray_direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let inv = Vec3::new(
        if ray_direction.x != 0.0 { 1.0 / ray_direction.x } else { f32::INFINITY },
        if ray_direction.y != 0.0 { 1.0 / ray_direction.y } else { f32::INFINITY },
        if ray_direction.z != 0.0 { 1.0 / ray_direction.z } else { f32::INFINITY },
    );

    let mut tmin = f32::NEG_INFINITY;
    let mut tmax = f32::INFINITY;
    for axis in 0..3 {
        if ray_direction[axis] == 0.0 {
            if ray_origin[axis] < min[axis] || ray_origin[axis] > max[axis] {
                return None;
            }
            continue;
        }
        let (mut t0, mut t1) = (
            (min[axis] - ray_origin[axis]) * inv[axis],
            (max[axis] - ray_origin[axis]) * inv[axis],
        );
        if t0 > t1 { std::mem::swap(&mut t0, &mut t1); }
        tmin = tmin.max(t0);
        tmax = tmax.min(t1);
        if tmin > tmax { return None; }
    }

    if tmax < 0.0 { return None; }
    Some(if tmin >= 0.0 { tmin } else { tmax })
}

// Axis whose coordinate sits closest to its face, relative to the half extent
fn face_normal(local_point: Vec3, half_extent: Vec3) -> Vec3 {
    let mut best_axis = 0;
    let mut best = f32::NEG_INFINITY;
    for axis in 0..3 {
        let h = half_extent[axis].max(f32::EPSILON);
        let closeness = local_point[axis].abs() / h;
        if closeness > best {
            best = closeness;
            best_axis = axis;
        }
    }
    let mut normal = Vec3::ZERO;
    normal[best_axis] = local_point[best_axis].signum();
    normal
}

/// Intersection of a ray with the horizontal plane at `height`.
pub fn ray_hits_horizontal_plane(ray: Ray3d, height: f32) -> Option<Vec3> {
    let denom = ray.direction.y;
    if denom.abs() < 1e-6 {
        return None;
    }
    let t = (height - ray.origin.y) / denom;
    if t < 0.0 {
        return None;
    }
    Some(ray.get_point(t))
}

/// Point on the infinite line `line_origin + s * line_dir` closest to the ray.
pub fn closest_point_on_line_to_ray(line_origin: Vec3, line_dir: Vec3, ray: Ray3d) -> Option<Vec3> {
    let u = line_dir.normalize_or_zero();
    let v = *ray.direction;
    let w = line_origin - ray.origin;
    let b = u.dot(v);
    let denom = 1.0 - b * b;
    if u == Vec3::ZERO || denom.abs() < 1e-6 {
        return None;
    }
    let d = u.dot(w);
    let e = v.dot(w);
    let s = (b * e - d) / denom;
    Some(line_origin + u * s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ray(origin: Vec3, dir: Vec3) -> Ray3d {
        Ray3d {
            origin,
            direction: Dir3::new(dir).unwrap(),
        }
    }

    #[test]
    fn ray_hits_front_face_of_box() {
        let hit = ray_hits_obb(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::NEG_Z,
            Transform::IDENTITY,
            Vec3::splat(2.0),
        )
        .unwrap();
        assert_abs_diff_eq!(hit.t, 4.0, epsilon = 1e-5);
        assert_eq!(hit.local_normal, Vec3::Z);
    }

    #[test]
    fn ray_missing_box_returns_none() {
        let hit = ray_hits_obb(
            Vec3::new(3.0, 0.0, 5.0),
            Vec3::NEG_Z,
            Transform::IDENTITY,
            Vec3::splat(2.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn hit_respects_box_rotation_and_translation() {
        let xf = Transform::from_xyz(1.0, 0.0, 0.0)
            .with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let hit = ray_hits_obb(Vec3::new(1.0, 5.0, 0.0), Vec3::NEG_Y, xf, Vec3::new(2.0, 1.0, 0.5))
            .unwrap();
        assert_abs_diff_eq!(hit.t, 4.5, epsilon = 1e-5);
        assert_eq!(hit.local_normal, Vec3::Y);
    }

    #[test]
    fn horizontal_plane_behind_ray_is_ignored() {
        let r = ray(Vec3::new(0.0, 1.0, 0.0), Vec3::Y);
        assert!(ray_hits_horizontal_plane(r, 0.0).is_none());
        let r = ray(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, -1.0, -1.0));
        let hit = ray_hits_horizontal_plane(r, 0.0).unwrap();
        assert_abs_diff_eq!(hit.z, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn closest_point_on_vertical_line() {
        let r = ray(Vec3::new(0.0, 2.0, 5.0), Vec3::NEG_Z);
        let p = closest_point_on_line_to_ray(Vec3::ZERO, Vec3::Y, r).unwrap();
        assert_abs_diff_eq!(p.y, 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-5);
    }
}
