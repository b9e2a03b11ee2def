//! Battle terrain types and their effects
//!
//! The coast is the battlefield: water hexes carry ships and amphibious
//! craft, dense inland terrain hides defenders and cuts sight lines.

use serde::{Deserialize, Serialize};

/// How a unit moves, which decides what terrain it may enter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementDomain {
    Foot,
    Tracked,
    Amphibious,
    Naval,
    Air,
    /// Emplaced; never moves
    Static,
}

impl MovementDomain {
    /// Domains that touch the ground and are affected by mines and craters
    pub fn is_ground(&self) -> bool {
        matches!(
            self,
            MovementDomain::Foot | MovementDomain::Tracked | MovementDomain::Amphibious
        )
    }
}

/// Primary terrain type for a battle hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Terrain {
    DeepWater,
    Shallows,
    Beach,
    #[default]
    Clear,
    Road,
    Forest,
    Jungle,
    Swamp,
    Hills,
    Mountain,
    Urban,
}

impl Terrain {
    /// Cost to enter this terrain, `None` when impassable for the domain
    pub fn movement_cost(&self, domain: MovementDomain) -> Option<u32> {
        use MovementDomain::*;
        use Terrain::*;

        match (domain, self) {
            (Static, _) => None,
            (Air, _) => Some(1),

            (Naval, DeepWater) => Some(1),
            (Naval, Shallows) => Some(2),
            (Naval, _) => None,

            (_, Road) | (_, Clear) | (_, Beach) => Some(1),
            (_, Mountain) if domain != Foot => None,
            (_, Mountain) => Some(3),

            (Foot, DeepWater) => None,
            (Foot, Shallows) => Some(2),
            (Foot, Swamp) => Some(3),
            (Foot, Forest) | (Foot, Jungle) | (Foot, Hills) | (Foot, Urban) => Some(2),

            (Tracked, DeepWater) | (Tracked, Shallows) => None,
            (Tracked, Jungle) | (Tracked, Swamp) => None,
            (Tracked, Forest) => Some(3),
            (Tracked, Hills) | (Tracked, Urban) => Some(2),

            (Amphibious, DeepWater) | (Amphibious, Shallows) => Some(1),
            (Amphibious, Jungle) => None,
            (Amphibious, Forest) => Some(3),
            (Amphibious, Swamp) | (Amphibious, Hills) | (Amphibious, Urban) => Some(2),
        }
    }

    /// Does this terrain block line of sight?
    pub fn blocks_los(&self) -> bool {
        matches!(
            self,
            Terrain::Forest | Terrain::Jungle | Terrain::Urban | Terrain::Mountain
        )
    }

    /// Added to the defender's hit threshold
    pub fn cover(&self) -> u32 {
        match self {
            Terrain::Forest | Terrain::Hills => 1,
            Terrain::Jungle | Terrain::Urban | Terrain::Mountain => 2,
            _ => 0,
        }
    }

    /// Can units hide in this terrain?
    pub fn provides_concealment(&self) -> bool {
        matches!(
            self,
            Terrain::Forest | Terrain::Jungle | Terrain::Urban | Terrain::Swamp
        )
    }

    pub fn is_water(&self) -> bool {
        matches!(self, Terrain::DeepWater | Terrain::Shallows)
    }
}

/// Terrain features that can exist on a hex (in addition to base terrain)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainFeature {
    /// Lets foot and tracked units cross water
    Bridge,
    Minefield,
    Crater,
}

impl TerrainFeature {
    /// Additional movement cost for the domain
    pub fn movement_penalty(&self, domain: MovementDomain) -> u32 {
        if !domain.is_ground() {
            return 0;
        }
        match self {
            TerrainFeature::Bridge => 0,
            TerrainFeature::Minefield => 2,
            TerrainFeature::Crater => 1,
        }
    }

    /// Defense bonus (additive)
    pub fn cover(&self) -> u32 {
        match self {
            TerrainFeature::Crater => 1,
            _ => 0,
        }
    }
}

/// Entry cost of a hex given its terrain and features
pub fn hex_entry_cost(
    terrain: Terrain,
    features: &[TerrainFeature],
    domain: MovementDomain,
) -> Option<u32> {
    let bridged = features.contains(&TerrainFeature::Bridge)
        && terrain.is_water()
        && matches!(domain, MovementDomain::Foot | MovementDomain::Tracked);

    let base = if bridged {
        1
    } else {
        terrain.movement_cost(domain)?
    };

    let penalty: u32 = features.iter().map(|f| f.movement_penalty(domain)).sum();
    Some(base + penalty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_terrain_costs_one_for_ground() {
        for domain in [
            MovementDomain::Foot,
            MovementDomain::Tracked,
            MovementDomain::Amphibious,
        ] {
            assert_eq!(Terrain::Clear.movement_cost(domain), Some(1));
        }
    }

    #[test]
    fn test_dense_terrain_blocks_los() {
        assert!(Terrain::Forest.blocks_los());
        assert!(Terrain::Jungle.blocks_los());
        assert!(Terrain::Urban.blocks_los());
        assert!(!Terrain::Clear.blocks_los());
        assert!(!Terrain::Shallows.blocks_los());
    }

    #[test]
    fn test_jungle_provides_cover() {
        assert_eq!(Terrain::Jungle.cover(), 2);
        assert!(Terrain::Jungle.cover() > Terrain::Beach.cover());
    }

    #[test]
    fn test_water_by_domain() {
        assert_eq!(Terrain::DeepWater.movement_cost(MovementDomain::Foot), None);
        assert_eq!(Terrain::DeepWater.movement_cost(MovementDomain::Amphibious), Some(1));
        assert_eq!(Terrain::DeepWater.movement_cost(MovementDomain::Naval), Some(1));
        assert_eq!(Terrain::Beach.movement_cost(MovementDomain::Naval), None);
        assert_eq!(Terrain::Mountain.movement_cost(MovementDomain::Air), Some(1));
    }

    #[test]
    fn test_static_never_moves() {
        assert_eq!(Terrain::Road.movement_cost(MovementDomain::Static), None);
    }

    #[test]
    fn test_bridge_makes_water_crossable() {
        let bridge = [TerrainFeature::Bridge];
        assert_eq!(
            hex_entry_cost(Terrain::DeepWater, &bridge, MovementDomain::Foot),
            Some(1)
        );
        assert_eq!(
            hex_entry_cost(Terrain::DeepWater, &bridge, MovementDomain::Tracked),
            Some(1)
        );
        assert_eq!(hex_entry_cost(Terrain::DeepWater, &[], MovementDomain::Foot), None);
    }

    #[test]
    fn test_minefield_slows_ground_only() {
        let mines = [TerrainFeature::Minefield];
        assert_eq!(hex_entry_cost(Terrain::Beach, &mines, MovementDomain::Foot), Some(3));
        assert_eq!(hex_entry_cost(Terrain::Beach, &mines, MovementDomain::Air), Some(1));
    }

    #[test]
    fn test_crater_adds_cover() {
        assert_eq!(TerrainFeature::Crater.cover(), 1);
        assert_eq!(TerrainFeature::Bridge.cover(), 0);
    }
}
