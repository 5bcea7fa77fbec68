pub mod association;
pub mod bbox;
pub mod blob;
pub mod config;
pub mod contour;
pub mod controller;
pub mod error;
pub mod estimator;
pub mod geometry;
pub mod hsv;
pub mod hue;
pub mod image;
pub mod masker;
pub mod morphology;
pub mod my_types;
pub mod session;
pub mod synthetic;
pub mod visualization;
