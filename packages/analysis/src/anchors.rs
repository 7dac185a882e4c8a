//! Coastal anchor locations that synthetic hazard groups are generated
//! around, spanning the Gujarat, Konkan, Malabar, Coromandel, and Odisha /
//! West Bengal coastlines.

use coastal_hazard_models::LatLon;

/// The documented 20 anchors, in group order (group 1 is the first entry).
pub const COASTAL_ANCHORS: [LatLon; 20] = [
    LatLon::new(23.5, 68.5),
    LatLon::new(20.0, 72.8),
    LatLon::new(13.0, 74.8),
    LatLon::new(10.0, 76.2),
    LatLon::new(8.4, 77.0),
    LatLon::new(12.8, 80.3),
    LatLon::new(15.5, 80.0),
    LatLon::new(17.7, 83.3),
    LatLon::new(19.8, 85.8),
    LatLon::new(21.6, 87.5),
    LatLon::new(22.2, 88.1),
    LatLon::new(15.0, 73.8),
    LatLon::new(9.3, 79.0),
    LatLon::new(16.7, 82.2),
    LatLon::new(18.5, 84.0),
    LatLon::new(11.0, 75.8),
    LatLon::new(21.0, 69.1),
    LatLon::new(20.7, 70.9),
    LatLon::new(22.0, 72.5),
    LatLon::new(22.6, 88.3),
];
