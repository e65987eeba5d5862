/**
* filename : mod
* author : HAMA
* date: 2025. 5. 11.
* description:
**/

pub mod advisor;

pub use advisor::*;
