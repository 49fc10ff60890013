//! Themed scene layouts: structures, refuges and baseline sky.

use engine_core::{Quat, Transform, Vec3};
use rand::Rng;

use crate::config::{CollapseConfig, Theme};
use crate::destruction::{Structure, StructureKind};
use crate::events::AmbientTone;
use crate::safety::Refuge;

/// Pyramid footprints as (base radius, height), cycled over the sites.
const PYRAMID_SIZES: [(f32, f32); 5] = [
    (40.0, 60.0),
    (30.0, 45.0),
    (25.0, 35.0),
    (50.0, 80.0),
    (20.0, 30.0),
];

const PYRAMID_SITES: [(f32, f32); 8] = [
    (-100.0, -100.0),
    (120.0, -80.0),
    (-150.0, 120.0),
    (80.0, 150.0),
    (0.0, -200.0),
    (200.0, 0.0),
    (-80.0, 80.0),
    (150.0, -150.0),
];

const BUNKER_SITES: [(f32, f32); 4] = [(-60.0, -60.0), (70.0, 70.0), (-90.0, 90.0), (110.0, -80.0)];

const MANSION_POSITION: Vec3 = Vec3::new(200.0, 17.5, -200.0);
const MANSION_HALF_EXTENTS: Vec3 = Vec3::new(105.0, 17.5, 35.0);

/// City blocks are laid out on this grid pitch.
const CITY_BLOCK: f32 = 60.0;

/// Everything the simulation needs from the static scene.
#[derive(Debug, Clone)]
pub struct WorldLayout {
    pub structures: Vec<Structure>,
    pub refuges: Vec<Refuge>,
    pub baseline_tone: AmbientTone,
}

impl WorldLayout {
    pub fn build(theme: Theme, refuge_radius: f32, collapse: &CollapseConfig, rng: &mut impl Rng) -> Self {
        let layout = match theme {
            Theme::Desert => Self::desert(refuge_radius, collapse, rng),
            Theme::City => Self::city(refuge_radius, collapse, rng),
        };
        log::info!(
            "{:?} scene: {} structures, {} refuges",
            theme,
            layout.structures.len(),
            layout.refuges.len()
        );
        layout
    }

    /// Eight pyramids, one enterable mansion and four bunkers.
    pub fn desert(refuge_radius: f32, collapse: &CollapseConfig, rng: &mut impl Rng) -> Self {
        let mut structures: Vec<Structure> = PYRAMID_SITES
            .iter()
            .enumerate()
            .map(|(i, &(x, z))| {
                let (base, height) = PYRAMID_SIZES[i % PYRAMID_SIZES.len()];
                // Square cone turned 45° about y; corners sit on the axes.
                let half = base * std::f32::consts::FRAC_1_SQRT_2;
                let transform = Transform::from_position_rotation(
                    Vec3::new(x, height / 2.0, z),
                    Quat::from_rotation_y(std::f32::consts::FRAC_PI_4),
                );
                Structure::new(
                    StructureKind::Pyramid,
                    transform,
                    Vec3::new(half, height / 2.0, half),
                    false,
                    collapse.debris_per_structure,
                    rng,
                )
            })
            .collect();

        structures.push(Structure::new(
            StructureKind::Mansion,
            Transform::from_position(MANSION_POSITION),
            MANSION_HALF_EXTENTS,
            true,
            0,
            rng,
        ));

        Self {
            structures,
            refuges: bunkers(refuge_radius),
            baseline_tone: AmbientTone::DESERT,
        }
    }

    /// Grid of office blocks with the bunkers and spawn point kept clear.
    pub fn city(refuge_radius: f32, collapse: &CollapseConfig, rng: &mut impl Rng) -> Self {
        let refuges = bunkers(refuge_radius);
        let mut structures = Vec::new();

        for gx in -3..=3 {
            for gz in -3..=3 {
                let center = Vec3::new(gx as f32 * CITY_BLOCK, 0.0, gz as f32 * CITY_BLOCK);
                let near_refuge = refuges
                    .iter()
                    .any(|r| horizontal_distance(r.position, center) < refuge_radius + 20.0);
                if near_refuge || center.length() < 30.0 {
                    continue;
                }

                let height = rng.gen_range(20.0..80.0);
                let half = Vec3::new(rng.gen_range(8.0..14.0), height / 2.0, rng.gen_range(8.0..14.0));
                structures.push(Structure::new(
                    StructureKind::Building,
                    Transform::from_position(Vec3::new(center.x, height / 2.0, center.z)),
                    half,
                    false,
                    collapse.debris_per_structure,
                    rng,
                ));
            }
        }

        Self {
            structures,
            refuges,
            baseline_tone: AmbientTone::CITY,
        }
    }
}

fn bunkers(radius: f32) -> Vec<Refuge> {
    BUNKER_SITES
        .iter()
        .map(|&(x, z)| Refuge::new(Vec3::new(x, 0.0, z), radius))
        .collect()
}

pub(crate) fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    Vec3::new(a.x - b.x, 0.0, a.z - b.z).length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::Aabb;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn desert_matches_campaign_layout() {
        let mut rng = StdRng::seed_from_u64(1);
        let layout = WorldLayout::build(Theme::Desert, 25.0, &CollapseConfig::default(), &mut rng);
        assert_eq!(layout.structures.len(), 9);
        assert_eq!(layout.refuges.len(), 4);
        assert_eq!(layout.structures.iter().filter(|s| s.enterable).count(), 1);
        assert_eq!(layout.baseline_tone, AmbientTone::DESERT);
    }

    #[test]
    fn spawn_point_is_clear_in_both_themes() {
        let player = Aabb::from_center(Vec3::new(0.0, 2.0, 0.0), Vec3::ONE);
        for theme in [Theme::Desert, Theme::City] {
            let mut rng = StdRng::seed_from_u64(2);
            let layout = WorldLayout::build(theme, 25.0, &CollapseConfig::default(), &mut rng);
            assert!(layout
                .structures
                .iter()
                .filter(|s| s.is_solid())
                .all(|s| !s.bounds().intersects(&player)));
        }
    }

    #[test]
    fn city_keeps_refuges_open() {
        let mut rng = StdRng::seed_from_u64(3);
        let layout = WorldLayout::city(25.0, &CollapseConfig::default(), &mut rng);
        assert!(!layout.structures.is_empty());
        for refuge in &layout.refuges {
            let probe = Aabb::from_center(refuge.position + Vec3::Y * 2.0, Vec3::ONE);
            assert!(layout.structures.iter().all(|s| !s.bounds().intersects(&probe)));
        }
    }
}
