use super::super::modification::{ModSink, VoxelMod};
use crate::noise::NoiseField;
use crate::worldgen::FloraParams;

/// Trunk height between the flora bounds, picked by a fixed noise channel.
fn pick_height(noise: &NoiseField, x: i32, z: i32, offset: f32, scale: f32, min: i32, max: i32) -> i32 {
    let t = noise.sample_2d(x as f32, z as f32, offset, scale);
    let raw = min as f32 + (max - min) as f32 * t;
    (raw as i32).max(min)
}

/// Tree rooted on the surface voxel `(x, y, z)`: a log trunk from `y + 1`,
/// a 5x5 leaf canopy over the top layers narrowing to a plus at the crown.
pub fn make_tree<S: ModSink + ?Sized>(noise: &NoiseField, f: &FloraParams, x: i32, y: i32, z: i32, mods: &mut S) {
    let h = pick_height(noise, x, z, 500.0, 3.0, f.min_height, f.max_height);
    for i in 1..=h {
        mods.push_mod(VoxelMod::new(x, y + i, z, f.trunk));
    }
    mods.push_mod(VoxelMod::new(x, y + h + 1, z, f.crown));

    for dx in -2..=2 {
        for dy in (h - 2)..=h {
            for dz in -2..=2 {
                if dx == 0 && dz == 0 {
                    continue;
                }
                if dy < h {
                    mods.push_mod(VoxelMod::new(x + dx, y + dy, z + dz, f.crown));
                } else if (-1..=1).contains(&dx) && (-1..=1).contains(&dz) {
                    mods.push_mod(VoxelMod::new(x + dx, y + dy, z + dz, f.crown));
                    if dx == 0 || dz == 0 {
                        mods.push_mod(VoxelMod::new(x + dx, y + dy + 1, z + dz, f.crown));
                    }
                }
            }
        }
    }
}

/// Cactus rooted on `(x, y, z)`: a column of body blocks capped with the crown block.
pub fn make_cactus<S: ModSink + ?Sized>(noise: &NoiseField, f: &FloraParams, x: i32, y: i32, z: i32, mods: &mut S) {
    let h = pick_height(noise, x, z, 23456.0, 2.0, f.min_height, f.max_height);
    for i in 1..h {
        mods.push_mod(VoxelMod::new(x, y + i, z, f.trunk));
    }
    mods.push_mod(VoxelMod::new(x, y + h, z, f.crown));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worldgen::FloraKind;
    use std::collections::HashMap;

    fn tree_params(min: i32, max: i32) -> FloraParams {
        FloraParams {
            enabled: true,
            kind: FloraKind::Tree,
            zone_offset: 0.0,
            zone_scale: 1.3,
            zone_threshold: 0.6,
            placement_offset: 250.0,
            placement_scale: 15.0,
            placement_threshold: 0.8,
            min_height: min,
            max_height: max,
            trunk: 6,
            crown: 11,
        }
    }

    #[test]
    fn fixed_height_tree_shape() {
        let noise = NoiseField::new(3);
        let f = tree_params(5, 5);
        let mut mods = Vec::new();
        make_tree(&noise, &f, 10, 40, 20, &mut mods);

        // Trunk occupies y+1..=y+5 and nothing else overwrites that column below the crown.
        let mut last: HashMap<(i32, i32, i32), u8> = HashMap::new();
        for m in &mods {
            last.insert((m.x, m.y, m.z), m.block);
        }
        for i in 1..=5 {
            assert_eq!(last.get(&(10, 40 + i, 20)), Some(&6));
        }
        assert_eq!(last.get(&(10, 46, 20)), Some(&11));

        // Lower canopy layers are full 5x5 rings.
        for dy in [3, 4] {
            for dx in -2..=2 {
                for dz in -2..=2 {
                    if dx == 0 && dz == 0 {
                        continue;
                    }
                    assert_eq!(last.get(&(10 + dx, 40 + dy, 20 + dz)), Some(&11));
                }
            }
        }
        // Top canopy layer is 3x3 and the layer above is a plus.
        assert_eq!(last.get(&(12, 45, 20)), None);
        assert_eq!(last.get(&(11, 45, 21)), Some(&11));
        assert_eq!(last.get(&(11, 46, 20)), Some(&11));
        assert_eq!(last.get(&(11, 46, 21)), None);

        // 5 trunk + 1 crown + 2*24 ring + 8 top + 4 plus
        assert_eq!(mods.len(), 5 + 1 + 48 + 8 + 4);
    }

    #[test]
    fn tree_height_stays_within_bounds() {
        let noise = NoiseField::new(11);
        let f = tree_params(4, 7);
        for i in 0..64 {
            let (x, z) = (i * 13, i * -7);
            let mut mods = Vec::new();
            make_tree(&noise, &f, x, 50, z, &mut mods);
            let trunk = mods.iter().filter(|m| m.block == 6).count() as i32;
            assert!((4..=7).contains(&trunk), "trunk {trunk}");
        }
    }

    #[test]
    fn cactus_is_a_capped_column() {
        let noise = NoiseField::new(11);
        let f = FloraParams {
            kind: FloraKind::Cactus,
            trunk: 12,
            crown: 13,
            ..tree_params(3, 3)
        };
        let mut mods = Vec::new();
        make_cactus(&noise, &f, 0, 10, 0, &mut mods);
        assert_eq!(
            mods,
            vec![
                VoxelMod::new(0, 11, 0, 12),
                VoxelMod::new(0, 12, 0, 12),
                VoxelMod::new(0, 13, 0, 13),
            ]
        );
    }
}
