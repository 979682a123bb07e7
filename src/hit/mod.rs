use crate::layer::{Layer, LayerCommon};

pub const DEFAULT_TEXT_HIT_PADDING_PX: f32 = 10.0;

/// Top-most visible layer under a canvas point.
pub fn hit_test(layers: &[Layer], x: f32, y: f32) -> Option<&Layer> {
    hit_test_padded(layers, x, y, DEFAULT_TEXT_HIT_PADDING_PX)
}

/// Like [`hit_test`] with an explicit touch padding for text layers, in local pixels.
///
/// Highest z-index wins; on equal z-index the layer later in the list wins, matching paint
/// order.
pub fn hit_test_padded(layers: &[Layer], x: f32, y: f32, text_padding: f32) -> Option<&Layer> {
    layers
        .iter()
        .enumerate()
        .filter(|(_, layer)| layer.visible())
        .filter(|(_, layer)| contains_point(layer, x, y, text_padding))
        .max_by_key(|(index, layer)| (layer.z_index(), *index))
        .map(|(_, layer)| layer)
}

/// Whether a canvas point falls inside the layer's rotated, scaled rectangle.
pub fn contains_point(layer: &Layer, x: f32, y: f32, text_padding: f32) -> bool {
    let Some((width, height)) = layer.content_size() else {
        return false;
    };
    let padding = match layer {
        Layer::Text(_) => text_padding.max(0.0),
        Layer::Image(_) => 0.0,
    };
    let half_width = width / 2.0 + padding;
    let half_height = height / 2.0 + padding;

    let (local_x, local_y) = layer.transform().canvas_to_local(x, y);
    local_x.abs() <= half_width && local_y.abs() <= half_height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Transform;
    use crate::layer::test_support::{image_layer, text_layer};
    use crate::layer::{ImageLayer, LayerId};

    fn hit_id(layers: &[Layer], x: f32, y: f32) -> Option<LayerId> {
        hit_test(layers, x, y).map(LayerCommon::id)
    }

    #[test]
    fn point_outside_unrotated_bounds_misses() {
        let layers = vec![image_layer(1, 100, 50, Transform::at(200.0, 200.0), 0)];
        assert_eq!(hit_id(&layers, 250.0, 200.0), Some(LayerId::new(1)));
        assert_eq!(hit_id(&layers, 250.5, 200.0), None);
        assert_eq!(hit_id(&layers, 200.0, 225.5), None);
    }

    #[test]
    fn center_always_hits_regardless_of_rotation_and_scale() {
        for (scale, rotation) in [(0.1, 0.0), (2.0, 33.0), (0.5, -170.0), (1.0, 90.0)] {
            let layers = vec![image_layer(
                1,
                40,
                10,
                Transform::new(120.0, 80.0, scale, rotation),
                0,
            )];
            assert_eq!(hit_id(&layers, 120.0, 80.0), Some(LayerId::new(1)));
        }
    }

    #[test]
    fn rotation_moves_the_hit_area() {
        let layers = vec![image_layer(1, 100, 10, Transform::new(0.0, 0.0, 1.0, 90.0), 0)];
        assert_eq!(hit_id(&layers, 0.0, 45.0), Some(LayerId::new(1)));
        assert_eq!(hit_id(&layers, 45.0, 0.0), None);
    }

    #[test]
    fn overlapping_layers_resolve_to_highest_z_index() {
        let layers = vec![
            image_layer(2, 50, 50, Transform::at(100.0, 100.0), 1),
            image_layer(1, 50, 50, Transform::at(100.0, 100.0), 0),
        ];
        assert_eq!(hit_id(&layers, 100.0, 100.0), Some(LayerId::new(2)));
    }

    #[test]
    fn invisible_and_unloaded_layers_never_hit() {
        let hidden = image_layer(1, 50, 50, Transform::at(0.0, 0.0), 5).with_visible(false);
        let unloaded = match image_layer(2, 50, 50, Transform::at(0.0, 0.0), 4) {
            Layer::Image(image) => Layer::Image(ImageLayer::without_pixels(image)),
            other => other,
        };
        let below = image_layer(3, 50, 50, Transform::at(0.0, 0.0), 0);
        let layers = vec![hidden, unloaded, below];
        assert_eq!(hit_id(&layers, 0.0, 0.0), Some(LayerId::new(3)));
    }

    #[test]
    fn text_layers_get_touch_padding() {
        // 3 block glyphs at 20px: 30 x 20 raster
        let layers = vec![text_layer(1, "abc", Transform::at(100.0, 100.0), 0)];
        assert_eq!(hit_id(&layers, 124.0, 100.0), Some(LayerId::new(1)));
        assert_eq!(hit_id(&layers, 100.0, 120.0), Some(LayerId::new(1)));
        assert_eq!(hit_id(&layers, 126.0, 100.0), None);
        assert_eq!(
            hit_test_padded(&layers, 124.0, 100.0, 0.0).map(LayerCommon::id),
            None
        );
    }
}
