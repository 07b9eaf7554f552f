//! Decoration placement: vegetation and small structures on the surface.
//!
//! Each column is tested against the decoration catalog in order and the
//! first rule whose biome, surface, slope and variant match and whose
//! per-column probability roll hits is placed. Schematic decorations also
//! need the column to be the candidate of a jittered grid (one candidate per
//! `2r x 2r` cell), which keeps them apart without reading neighbouring
//! chunks. A chunk evaluates every column within schematic reach of its
//! border, in world order, so a tree straddling a border is stamped
//! identically into both chunks.

use std::sync::atomic::{AtomicBool, Ordering};

use nebula_config::DecorationConfig;

use crate::biome::{Band, BiomeId};
use crate::chunk::{Block, CHUNK_HEIGHT, CHUNK_SIZE, Chunk};
use crate::seed::{WorldSeed, hash_coords, hash_unit, offsets};

/// Conditions shared by every decoration kind.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementRule {
    pub biomes: Vec<BiomeId>,
    /// Surface blocks the decoration may stand on.
    pub surfaces: Vec<Block>,
    /// Chance per eligible column (or grid candidate), before the vegetation multiplier.
    pub probability: f32,
    /// Admitted range of the sub-biome variant noise.
    pub variant: Band,
    pub max_slope: i32,
}

/// One block of a schematic, relative to the air block above the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchematicBlock {
    pub dx: i32,
    pub dy: i32,
    pub dz: i32,
    pub block: Block,
}

/// A catalog entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Decoration {
    /// A single block on top of the surface.
    Simple {
        name: String,
        block: Block,
        rule: PlacementRule,
    },
    /// A multi-block structure, kept apart by a spacing radius.
    Schematic {
        name: String,
        blocks: Vec<SchematicBlock>,
        spacing: i32,
        rule: PlacementRule,
    },
}

impl Decoration {
    pub fn name(&self) -> &str {
        match self {
            Decoration::Simple { name, .. } | Decoration::Schematic { name, .. } => name,
        }
    }

    pub fn rule(&self) -> &PlacementRule {
        match self {
            Decoration::Simple { rule, .. } | Decoration::Schematic { rule, .. } => rule,
        }
    }

    /// Horizontal distance from the anchor column to the farthest block.
    pub fn reach(&self) -> i32 {
        match self {
            Decoration::Simple { .. } => 0,
            Decoration::Schematic { blocks, .. } => blocks
                .iter()
                .map(|b| b.dx.abs().max(b.dz.abs()))
                .max()
                .unwrap_or(0),
        }
    }

    /// Human-readable problem with this entry, if any.
    pub fn problem(&self) -> Option<&'static str> {
        let rule = self.rule();
        if !(0.0..=1.0).contains(&rule.probability) {
            return Some("probability must be in [0, 1]");
        }
        if rule.biomes.is_empty() || rule.surfaces.is_empty() {
            return Some("rule needs at least one biome and one surface");
        }
        if rule.variant.min > rule.variant.max {
            return Some("variant band is inverted");
        }
        if let Decoration::Schematic {
            blocks, spacing, ..
        } = self
        {
            if blocks.is_empty() {
                return Some("schematic has no blocks");
            }
            if *spacing < 1 {
                return Some("schematic spacing must be at least 1");
            }
        }
        None
    }
}

/// What the placer needs to know about a column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecorationSite {
    pub height: i32,
    pub biome: BiomeId,
    /// Planned surface block.
    pub surface: Block,
    pub slope: i32,
    pub variant: f32,
    /// Regional vegetation multiplier.
    pub vegetation: f32,
}

/// Picks and stamps decorations.
pub struct DecorationPlacer {
    seed: WorldSeed,
    scale: f32,
    sea_level: i32,
    reach: i32,
}

impl DecorationPlacer {
    pub fn new(
        seed: WorldSeed,
        config: &DecorationConfig,
        sea_level: i32,
        catalog: &[Decoration],
    ) -> Self {
        let reach = catalog.iter().map(Decoration::reach).max().unwrap_or(0);
        Self {
            seed,
            scale: config.vegetation_scale,
            sea_level,
            reach,
        }
    }

    /// Largest schematic reach in the catalog.
    pub fn reach(&self) -> i32 {
        self.reach
    }

    /// Whether `(x, z)` is the jittered-grid candidate of its cell for catalog entry `index`.
    pub fn is_grid_candidate(&self, index: usize, spacing: i32, x: i32, z: i32) -> bool {
        let spacing = spacing.max(1);
        let cell = spacing * 2;
        let (cx, cz) = (x.div_euclid(cell), z.div_euclid(cell));
        let h = hash_coords(self.seed.derive(offsets::DECORATION_GRID ^ index as u64), cx, cz);
        let jx = (h % spacing as u64) as i32;
        let jz = ((h >> 32) % spacing as u64) as i32;
        x == cx * cell + jx && z == cz * cell + jz
    }

    /// Index of the decoration placed at `(x, z)`, if any.
    pub fn choose(
        &self,
        catalog: &[Decoration],
        x: i32,
        z: i32,
        site: &DecorationSite,
    ) -> Option<usize> {
        if site.height < self.sea_level || site.height + 1 >= CHUNK_HEIGHT as i32 {
            return None;
        }
        catalog.iter().enumerate().find_map(|(index, decoration)| {
            let rule = decoration.rule();
            if !rule.biomes.contains(&site.biome)
                || !rule.surfaces.contains(&site.surface)
                || site.slope > rule.max_slope
                || !rule.variant.contains(site.variant)
            {
                return None;
            }
            if let Decoration::Schematic { spacing, .. } = decoration
                && !self.is_grid_candidate(index, *spacing, x, z)
            {
                return None;
            }
            let chance = rule.probability * site.vegetation * self.scale;
            let roll = hash_unit(self.seed.derive(offsets::DECORATION_ROLL ^ index as u64), x, z);
            (roll < chance).then_some(index)
        })
    }

    /// Decorate `chunk`, reading sites from `site_at` for every column within
    /// reach. Returns `false` if `stop` was raised part-way.
    pub fn decorate_chunk(
        &self,
        chunk: &mut Chunk,
        catalog: &[Decoration],
        mut site_at: impl FnMut(i32, i32) -> Option<DecorationSite>,
        stop: &AtomicBool,
    ) -> bool {
        let coord = chunk.coord();
        let (x0, z0) = (coord.world_x(), coord.world_z());
        let size = CHUNK_SIZE as i32;

        for wz in z0 - self.reach..z0 + size + self.reach {
            if stop.load(Ordering::Relaxed) {
                return false;
            }
            for wx in x0 - self.reach..x0 + size + self.reach {
                let Some(site) = site_at(wx, wz) else {
                    continue;
                };
                let Some(index) = self.choose(catalog, wx, wz, &site) else {
                    continue;
                };
                let base_y = site.height + 1;
                match &catalog[index] {
                    Decoration::Simple { block, .. } => {
                        place(chunk, wx - x0, base_y, wz - z0, *block);
                    }
                    Decoration::Schematic { blocks, .. } => {
                        for b in blocks {
                            place(chunk, wx + b.dx - x0, base_y + b.dy, wz + b.dz - z0, b.block);
                        }
                    }
                }
            }
        }
        true
    }
}

/// Set a block at local coordinates if they are inside the chunk and currently air.
fn place(chunk: &mut Chunk, lx: i32, y: i32, lz: i32, block: Block) {
    let size = CHUNK_SIZE as i32;
    if !(0..size).contains(&lx) || !(0..size).contains(&lz) || !(0..CHUNK_HEIGHT as i32).contains(&y)
    {
        return;
    }
    let (x, y, z) = (lx as usize, y as usize, lz as usize);
    if chunk.get(x, y, z) == Block::Air {
        chunk.set(x, y, z, block);
    }
}

// ---------------------------------------------------------------------------
// Built-in catalog
// ---------------------------------------------------------------------------

fn rule(biomes: &[BiomeId], surfaces: &[Block], probability: f32, max_slope: i32) -> PlacementRule {
    PlacementRule {
        biomes: biomes.to_vec(),
        surfaces: surfaces.to_vec(),
        probability,
        variant: Band::new(0.0, 1.0),
        max_slope,
    }
}

/// Broadleaf tree: straight trunk with a squared-off canopy.
fn broadleaf(log: Block, leaves: Block, trunk: i32, canopy: i32) -> Vec<SchematicBlock> {
    let mut blocks: Vec<SchematicBlock> = (0..trunk)
        .map(|dy| SchematicBlock {
            dx: 0,
            dy,
            dz: 0,
            block: log,
        })
        .collect();
    for dy in trunk - 2..=trunk {
        let r = if dy == trunk { canopy - 1 } else { canopy };
        for dz in -r..=r {
            for dx in -r..=r {
                if dx == 0 && dz == 0 && dy < trunk {
                    continue;
                }
                if r > 1 && dx.abs() == r && dz.abs() == r {
                    continue;
                }
                blocks.push(SchematicBlock {
                    dx,
                    dy,
                    dz,
                    block: leaves,
                });
            }
        }
    }
    blocks
}

/// Conifer: tall trunk with a stepped cone of leaves.
fn conifer(trunk: i32) -> Vec<SchematicBlock> {
    let mut blocks: Vec<SchematicBlock> = (0..trunk)
        .map(|dy| SchematicBlock {
            dx: 0,
            dy,
            dz: 0,
            block: Block::SpruceLog,
        })
        .collect();
    for dy in 2..=trunk {
        let r: i32 = match trunk - dy {
            0 => 0,
            1 | 3 => 1,
            _ => 2,
        };
        for dz in -r..=r {
            for dx in -r..=r {
                if (dx == 0 && dz == 0 && dy < trunk) || (r == 2 && dx.abs() == 2 && dz.abs() == 2) {
                    continue;
                }
                blocks.push(SchematicBlock {
                    dx,
                    dy,
                    dz,
                    block: Block::SpruceLeaves,
                });
            }
        }
    }
    blocks
}

fn column(block: Block, height: i32) -> Vec<SchematicBlock> {
    (0..height)
        .map(|dy| SchematicBlock {
            dx: 0,
            dy,
            dz: 0,
            block,
        })
        .collect()
}

/// The built-in decoration catalog, in priority order.
pub fn default_decorations() -> Vec<Decoration> {
    use BiomeId::*;
    let schematic = |name: &str, blocks, spacing, rule| Decoration::Schematic {
        name: name.into(),
        blocks,
        spacing,
        rule,
    };
    let simple = |name: &str, block, rule| Decoration::Simple {
        name: name.into(),
        block,
        rule,
    };

    let mut dense_oak = rule(&[Forest], &[Block::Grass], 0.9, 3);
    dense_oak.variant = Band::new(0.55, 1.0);
    let mut flower = rule(&[Plains, Forest], &[Block::Grass], 0.05, 4);
    flower.variant = Band::new(0.0, 0.45);

    vec![
        schematic(
            "dense_oak",
            broadleaf(Block::OakLog, Block::OakLeaves, 5, 2),
            2,
            dense_oak,
        ),
        schematic(
            "oak",
            broadleaf(Block::OakLog, Block::OakLeaves, 5, 2),
            4,
            rule(&[Forest, Plains, Foothills], &[Block::Grass], 0.45, 3),
        ),
        schematic(
            "spruce",
            conifer(7),
            3,
            rule(&[Taiga, Tundra], &[Block::Podzol, Block::Snow, Block::Grass], 0.6, 3),
        ),
        schematic(
            "jungle_tree",
            broadleaf(Block::JungleLog, Block::JungleLeaves, 8, 3),
            3,
            rule(&[Jungle], &[Block::Grass], 0.85, 3),
        ),
        schematic(
            "acacia",
            broadleaf(Block::AcaciaLog, Block::AcaciaLeaves, 5, 2),
            5,
            rule(&[Savanna, DryPlains], &[Block::Grass], 0.3, 3),
        ),
        schematic(
            "swamp_oak",
            broadleaf(Block::OakLog, Block::OakLeaves, 4, 2),
            4,
            rule(&[Swamp], &[Block::Mud, Block::Grass], 0.5, 2),
        ),
        schematic(
            "cactus",
            column(Block::Cactus, 3),
            3,
            rule(&[Desert], &[Block::Sand], 0.3, 2),
        ),
        simple(
            "tall_grass",
            Block::TallGrass,
            rule(
                &[Plains, Forest, Savanna, Jungle, DryPlains, Foothills, Swamp, Taiga],
                &[Block::Grass, Block::Mud, Block::Podzol],
                0.12,
                4,
            ),
        ),
        simple("flower", Block::Flower, flower),
        simple(
            "dead_bush",
            Block::DeadBush,
            rule(&[Desert, DryPlains], &[Block::Sand, Block::Grass], 0.02, 4),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkCoord;

    fn placer(catalog: &[Decoration]) -> DecorationPlacer {
        DecorationPlacer::new(WorldSeed::new(42), &DecorationConfig::default(), 64, catalog)
    }

    fn site(biome: BiomeId, surface: Block) -> DecorationSite {
        DecorationSite {
            height: 70,
            biome,
            surface,
            slope: 0,
            variant: 0.5,
            vegetation: 1.0,
        }
    }

    #[test]
    fn test_default_catalog_valid() {
        for d in default_decorations() {
            assert_eq!(d.problem(), None, "{} is invalid", d.name());
        }
    }

    #[test]
    fn test_reach_of_catalog() {
        let catalog = default_decorations();
        assert_eq!(placer(&catalog).reach(), 3, "jungle canopy radius");
    }

    #[test]
    fn test_conifer_cone() {
        let blocks = conifer(7);
        let top = blocks.iter().map(|b| b.dy).max();
        assert_eq!(top, Some(7));
        let tip: Vec<_> = blocks.iter().filter(|b| b.dy == 7).collect();
        assert_eq!(tip.len(), 1, "cone ends in a single leaf");
        assert_eq!((tip[0].dx, tip[0].dz, tip[0].block), (0, 0, Block::SpruceLeaves));
        for b in &blocks {
            assert!(b.dx.abs() <= 2 && b.dz.abs() <= 2);
            assert!(!(b.dx.abs() == 2 && b.dz.abs() == 2), "corners are trimmed: {b:?}");
            if b.dx == 0 && b.dz == 0 && b.dy < 7 {
                assert_eq!(b.block, Block::SpruceLog, "trunk at dy={}", b.dy);
            }
        }
    }

    #[test]
    fn test_one_grid_candidate_per_cell() {
        let catalog = default_decorations();
        let p = placer(&catalog);
        let spacing = 4;
        for cz in -3..3 {
            for cx in -3..3 {
                let mut candidates = 0;
                for z in cz * 8..cz * 8 + 8 {
                    for x in cx * 8..cx * 8 + 8 {
                        if p.is_grid_candidate(1, spacing, x, z) {
                            candidates += 1;
                        }
                    }
                }
                assert_eq!(candidates, 1, "cell ({cx}, {cz})");
            }
        }
    }

    #[test]
    fn test_grid_candidates_respect_spacing() {
        let catalog = default_decorations();
        let p = placer(&catalog);
        let spacing = 4;
        let mut points = Vec::new();
        for z in -64..64 {
            for x in -64..64 {
                if p.is_grid_candidate(1, spacing, x, z) {
                    points.push((x, z));
                }
            }
        }
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                let d = (a.0 - b.0).abs().max((a.1 - b.1).abs());
                assert!(d > spacing, "{a:?} and {b:?} are only {d} apart");
            }
        }
    }

    #[test]
    fn test_choose_respects_biome_and_surface() {
        let catalog = default_decorations();
        let p = placer(&catalog);
        for x in 0..500 {
            if let Some(i) = p.choose(&catalog, x, 7, &site(BiomeId::Desert, Block::Sand)) {
                let name = catalog[i].name();
                assert!(name == "cactus" || name == "dead_bush", "{name} in desert");
            }
            assert_eq!(
                p.choose(&catalog, x, 7, &site(BiomeId::Ocean, Block::Sand)),
                None,
                "nothing grows in the ocean biome"
            );
        }
    }

    #[test]
    fn test_nothing_below_sea_level() {
        let catalog = default_decorations();
        let p = placer(&catalog);
        let mut s = site(BiomeId::Jungle, Block::Grass);
        s.height = 60;
        for x in 0..200 {
            assert_eq!(p.choose(&catalog, x, x, &s), None);
        }
    }

    #[test]
    fn test_vegetation_multiplier_scales_density() {
        let catalog = default_decorations();
        let p = placer(&catalog);
        let count = |vegetation: f32| {
            let mut s = site(BiomeId::Plains, Block::Grass);
            s.vegetation = vegetation;
            (0..4000)
                .filter(|i| p.choose(&catalog, i % 64, i / 64, &s).is_some())
                .count()
        };
        assert!(count(0.25) < count(1.75));
    }

    #[test]
    fn test_choose_deterministic() {
        let catalog = default_decorations();
        let a = placer(&catalog);
        let b = placer(&catalog);
        let s = site(BiomeId::Forest, Block::Grass);
        for x in 0..300 {
            assert_eq!(a.choose(&catalog, x, -x, &s), b.choose(&catalog, x, -x, &s));
        }
    }

    #[test]
    fn test_border_tree_identical_in_both_chunks() {
        let catalog = default_decorations();
        let p = placer(&catalog);
        let jungle = |_: i32, _: i32| Some(site(BiomeId::Jungle, Block::Grass));
        let stop = AtomicBool::new(false);

        let mut left = Chunk::new(ChunkCoord::new(0, 0));
        let mut right = Chunk::new(ChunkCoord::new(1, 0));
        assert!(p.decorate_chunk(&mut left, &catalog, jungle, &stop));
        assert!(p.decorate_chunk(&mut right, &catalog, jungle, &stop));

        // Regenerating the right chunk alone gives the same content.
        let mut again = Chunk::new(ChunkCoord::new(1, 0));
        assert!(p.decorate_chunk(&mut again, &catalog, jungle, &stop));
        assert_eq!(right.blocks(), again.blocks());

        // Some tree near x = 16 spills leaves across the border into both chunks.
        let left_edge = (0..CHUNK_SIZE).any(|z| {
            (71..82).any(|y| left.get(15, y, z) == Block::JungleLeaves)
        });
        let right_edge = (0..CHUNK_SIZE).any(|z| {
            (71..82).any(|y| right.get(0, y, z) == Block::JungleLeaves)
        });
        assert!(left_edge && right_edge, "dense jungle should cross the chunk border");
    }

    #[test]
    fn test_stop_flag_cancels() {
        let catalog = default_decorations();
        let p = placer(&catalog);
        let stop = AtomicBool::new(true);
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        assert!(!p.decorate_chunk(&mut chunk, &catalog, |_, _| None, &stop));
    }
}
