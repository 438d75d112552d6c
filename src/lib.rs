//! Vehicle Tracker
//!
//! Agrega el estado de impuestos (VES) y el historial MOT de cada vehículo
//! registrado, lo persiste en PostgreSQL y lo mantiene actualizado con un
//! refresco periódico en segundo plano.

pub mod clients;
pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
