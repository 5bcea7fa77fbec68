use std::collections::VecDeque;

use crate::geometry::Circle;
use crate::image::Image;
use crate::my_types::*;

/// Clockwise from east, y pointing down
const NEIGHBORS: [[i32; 2]; 8] = [
    [1, 0],
    [1, 1],
    [0, 1],
    [-1, 1],
    [-1, 0],
    [-1, -1],
    [0, -1],
    [1, -1],
];
const WEST: usize = 4;

/// Outer border of a foreground component, pixel centers in tracing order
#[derive(Clone, Debug, PartialEq)]
pub struct Contour {
    pub points: Vec<[i32; 2]>,
}

impl Contour {
    /// Shoelace area of the border polygon. A one pixel wide line has area 0.
    pub fn area(&self) -> f32 {
        let n = self.points.len();
        if n < 3 {
            return 0.;
        }
        let mut twice = 0_i64;
        for i in 0..n {
            let [x0, y0] = self.points[i];
            let [x1, y1] = self.points[(i + 1) % n];
            twice += x0 as i64 * y1 as i64 - x1 as i64 * y0 as i64;
        }
        twice.abs() as f32 / 2.
    }

    pub fn enclosing_circle(&self) -> Circle {
        let points: Vec<Vector2f> = self
            .points
            .iter()
            .map(|p| Vector2f::new(p[0] as f32, p[1] as f32))
            .collect();
        min_enclosing_circle(&points)
    }
}

/// Outer borders of the foreground components (8-connected) that are not
/// nested inside a hole of another component.
pub fn find_external_contours(mask: &Image) -> Vec<Contour> {
    let (w, h) = (mask.width, mask.height);
    if w == 0 || h == 0 {
        return vec![];
    }
    let outside = outside_background(mask);
    let mut visited = vec![false; w * h];
    let mut contours = vec![];

    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            if visited[i] || mask.data[i] == 0 {
                continue;
            }
            // raster order, so this is the top-left pixel of its component
            if label_component(mask, &outside, &mut visited, x, y) {
                contours.push(trace_border(mask, [x as i32, y as i32]));
            }
        }
    }
    contours
}

/// Background pixels 4-connected to the image border.
fn outside_background(mask: &Image) -> Vec<bool> {
    let (w, h) = (mask.width, mask.height);
    let mut outside = vec![false; w * h];
    let mut queue = VecDeque::new();

    let seed = |x: usize, y: usize, outside: &mut Vec<bool>, queue: &mut VecDeque<(usize, usize)>| {
        let i = y * w + x;
        if mask.data[i] == 0 && !outside[i] {
            outside[i] = true;
            queue.push_back((x, y));
        }
    };
    for x in 0..w {
        seed(x, 0, &mut outside, &mut queue);
        seed(x, h - 1, &mut outside, &mut queue);
    }
    for y in 0..h {
        seed(0, y, &mut outside, &mut queue);
        seed(w - 1, y, &mut outside, &mut queue);
    }

    while let Some((x, y)) = queue.pop_front() {
        for [dx, dy] in [[1, 0], [-1, 0], [0, 1], [0, -1]] {
            let (nx, ny) = (x as i32 + dx, y as i32 + dy);
            if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                continue;
            }
            seed(nx as usize, ny as usize, &mut outside, &mut queue);
        }
    }
    outside
}

/// Flood the component containing `(x, y)`. Returns true when the component
/// touches the image edge or the outside background.
fn label_component(
    mask: &Image,
    outside: &[bool],
    visited: &mut [bool],
    x: usize,
    y: usize,
) -> bool {
    let (w, h) = (mask.width as i32, mask.height as i32);
    let mut external = false;
    let mut queue = VecDeque::new();
    visited[y * mask.width + x] = true;
    queue.push_back([x as i32, y as i32]);

    while let Some([x, y]) = queue.pop_front() {
        for (k, [dx, dy]) in NEIGHBORS.iter().enumerate() {
            let (nx, ny) = (x + dx, y + dy);
            if nx < 0 || ny < 0 || nx >= w || ny >= h {
                external = true;
                continue;
            }
            let i = ny as usize * mask.width + nx as usize;
            if mask.data[i] == 0 {
                // only edge neighbours separate the component from the background
                if k % 2 == 0 && outside[i] {
                    external = true;
                }
                continue;
            }
            if !visited[i] {
                visited[i] = true;
                queue.push_back([nx, ny]);
            }
        }
    }
    external
}

/// Border following around the component whose top-left pixel is `start`.
fn trace_border(mask: &Image, start: [i32; 2]) -> Contour {
    let step = |p: [i32; 2], dir: usize| [p[0] + NEIGHBORS[dir][0], p[1] + NEIGHBORS[dir][1]];
    let direction = |from: [i32; 2], to: [i32; 2]| {
        NEIGHBORS
            .iter()
            .position(|d| d[0] == to[0] - from[0] && d[1] == to[1] - from[1])
            .unwrap_or(WEST)
    };

    // the west neighbour of the start is background, sweep counter clockwise from it
    let first = (0..8)
        .map(|k| (WEST + 8 - k) % 8)
        .map(|dir| step(start, dir))
        .find(|p| mask.is_set_i32(p[0], p[1]));
    let first = match first {
        Some(first) => first,
        None => {
            return Contour {
                points: vec![start],
            }
        }
    };

    let mut points = vec![];
    let mut previous = first;
    let mut current = start;
    loop {
        // sweep clockwise, starting just after the pixel we came from
        let back = direction(current, previous);
        let next = (1..=8)
            .map(|k| step(current, (back + k) % 8))
            .find(|p| mask.is_set_i32(p[0], p[1]))
            .unwrap_or(previous);
        points.push(current);
        if next == start && current == first {
            break;
        }
        previous = current;
        current = next;
    }
    Contour { points }
}

/// Smallest circle containing every point (Welzl, iterative form).
pub fn min_enclosing_circle(points: &[Vector2f]) -> Circle {
    let mut circle = match points.first() {
        Some(p) => Circle::new(*p, 0.),
        None => return Circle::new(Vector2f::zeros(), 0.),
    };
    for i in 1..points.len() {
        if contains(&circle, &points[i]) {
            continue;
        }
        circle = Circle::new(points[i], 0.);
        for j in 0..i {
            if contains(&circle, &points[j]) {
                continue;
            }
            circle = circle_from_two(&points[i], &points[j]);
            for k in 0..j {
                if !contains(&circle, &points[k]) {
                    circle = circle_from_three(&points[i], &points[j], &points[k]);
                }
            }
        }
    }
    circle
}

fn contains(circle: &Circle, p: &Vector2f) -> bool {
    (p - circle.center).norm() <= circle.radius + 1e-3
}

fn circle_from_two(a: &Vector2f, b: &Vector2f) -> Circle {
    let center = (a + b) * 0.5;
    Circle::new(center, (a - center).norm())
}

fn circle_from_three(a: &Vector2f, b: &Vector2f, c: &Vector2f) -> Circle {
    let ab = b - a;
    let ac = c - a;
    let d = 2. * (ab.x * ac.y - ab.y * ac.x);
    if d.abs() < 1e-6 {
        // collinear, the widest pair decides
        return [
            circle_from_two(a, b),
            circle_from_two(a, c),
            circle_from_two(b, c),
        ]
        .into_iter()
        .fold(Circle::new(*a, 0.), |best, candidate| {
            if candidate.radius > best.radius {
                candidate
            } else {
                best
            }
        });
    }
    let ab2 = ab.norm_squared();
    let ac2 = ac.norm_squared();
    let offset = Vector2f::new(
        (ac.y * ab2 - ab.y * ac2) / d,
        (ab.x * ac2 - ac.x * ab2) / d,
    );
    Circle::new(a + offset, offset.norm())
}
