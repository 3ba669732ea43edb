use super::{FeatureAttributeAccessor, PropertyFeature};

/// Content of a tile that has entered the visible set
pub trait TileContent: Send {
    /// Opaque handle for logging
    fn tile_key(&self) -> String;
    fn feature_count(&self) -> usize;
    fn get_feature(&mut self, index: usize) -> Option<&mut dyn FeatureAttributeAccessor>;
}

/// Tile content held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryTile {
    key: String,
    features: Vec<PropertyFeature>,
}

impl InMemoryTile {
    pub fn new(key: impl Into<String>, features: Vec<PropertyFeature>) -> Self {
        Self {
            key: key.into(),
            features,
        }
    }

    pub fn features(&self) -> &[PropertyFeature] {
        &self.features
    }
}

impl TileContent for InMemoryTile {
    fn tile_key(&self) -> String {
        self.key.clone()
    }

    fn feature_count(&self) -> usize {
        self.features.len()
    }

    fn get_feature(&mut self, index: usize) -> Option<&mut dyn FeatureAttributeAccessor> {
        self.features
            .get_mut(index)
            .map(|f| f as &mut dyn FeatureAttributeAccessor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_tile() {
        let mut tile = InMemoryTile::new(
            "7/20/44",
            vec![
                PropertyFeature::building(1, 0.0, 0.0, 1.0),
                PropertyFeature::building(2, 0.0, 0.0, 2.0),
            ],
        );
        assert_eq!(tile.tile_key(), "7/20/44");
        assert_eq!(tile.feature_count(), 2);
        assert_eq!(tile.get_feature(1).and_then(|f| f.height()), Some(2.0));
        assert!(tile.get_feature(2).is_none());
    }
}
