use rand::Rng;

/// A position in percent of the container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Axis-aligned region candidates are drawn from, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: (f64, f64),
    pub y: (f64, f64),
}

impl Region {
    pub const fn new(x: (f64, f64), y: (f64, f64)) -> Self {
        Region { x, y }
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        Point {
            x: draw_between(rng, self.x),
            y: draw_between(rng, self.y),
        }
    }
}

fn draw_between<R: Rng + ?Sized>(rng: &mut R, (low, high): (f64, f64)) -> f64 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}

/// Points a candidate must keep `min_distance` away from.
#[derive(Debug, Clone, Copy)]
pub struct Exclusion<'a> {
    pub points: &'a [Point],
    pub min_distance: f64,
}

impl<'a> Exclusion<'a> {
    pub fn new(points: &'a [Point], min_distance: f64) -> Self {
        Exclusion {
            points,
            min_distance,
        }
    }

    fn admits(&self, candidate: &Point) -> bool {
        self.points
            .iter()
            .all(|point| point.distance(candidate) >= self.min_distance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub point: Point,
    pub attempts: u32,
    /// false when the attempt cap ran out and `point` may overlap
    pub clear: bool,
}

/// Bounded rejection sampler. It always returns: once `max_attempts` is
/// spent the last candidate is accepted as-is.
#[derive(Debug, Clone)]
pub struct PlacementSampler {
    regions: Vec<Region>,
    max_attempts: u32,
}

impl PlacementSampler {
    pub fn new(regions: Vec<Region>, max_attempts: u32) -> Self {
        PlacementSampler {
            regions,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn single(region: Region, max_attempts: u32) -> Self {
        Self::new(vec![region], max_attempts)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn candidate<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        match self.regions.len() {
            0 => Point::new(0.0, 0.0),
            1 => self.regions[0].draw(rng),
            len => self.regions[rng.gen_range(0..len)].draw(rng),
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, exclusions: &[Exclusion]) -> Sample {
        let mut point = self.candidate(rng);
        let mut attempts = 1;
        loop {
            if exclusions.iter().all(|exclusion| exclusion.admits(&point)) {
                return Sample {
                    point,
                    attempts,
                    clear: true,
                };
            }
            if attempts >= self.max_attempts {
                return Sample {
                    point,
                    attempts,
                    clear: false,
                };
            }
            point = self.candidate(rng);
            attempts += 1;
        }
    }

    /// Places `count` items that also keep `spacing` from each other.
    pub fn scatter<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        count: usize,
        spacing: f64,
        exclusions: &[Exclusion],
    ) -> Vec<Point> {
        let mut placed: Vec<Point> = Vec::with_capacity(count);
        for _ in 0..count {
            let sample = {
                let mut all = exclusions.to_vec();
                all.push(Exclusion::new(&placed, spacing));
                self.sample(rng, &all)
            };
            placed.push(sample.point);
        }
        placed
    }
}
