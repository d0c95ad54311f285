pub mod cupra;
