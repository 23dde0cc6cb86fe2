use serde::{Deserialize, Serialize};

use super::de_flexible_number;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuelType {
    Petrol,
    Diesel,
    Electric,
    Hybrid,
}

impl std::fmt::Display for FuelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FuelType::Petrol => write!(f, "Petrol"),
            FuelType::Diesel => write!(f, "Diesel"),
            FuelType::Electric => write!(f, "Electric"),
            FuelType::Hybrid => write!(f, "Hybrid"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transmission {
    Manual,
    Automatic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleSpec {
    #[serde(rename = "vehicleSpecId")]
    pub vehicle_spec_id: i64,
    pub manufacturer: String,
    pub model: String,
    pub year: i32,
    #[serde(rename = "fuelType")]
    pub fuel_type: FuelType,
    #[serde(rename = "engineCapacity")]
    pub engine_capacity: Option<String>,
    #[serde(default)]
    pub transmission: Option<Transmission>,
    #[serde(rename = "seatingCapacity")]
    pub seating_capacity: Option<i32>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub features: Option<String>,
}

impl VehicleSpec {
    pub fn display_name(&self) -> String {
        format!("{} {} {}", self.year, self.manufacturer, self.model)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(rename = "vehicleId")]
    pub vehicle_id: i64,
    // Numeric from the DB, sometimes serialized as a string
    #[serde(rename = "rentalRate", default, deserialize_with = "de_flexible_number")]
    pub rental_rate: Option<f64>,
    pub availability: bool,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(rename = "vehicleSpec")]
    pub vehicle_spec: Option<VehicleSpec>,
}

impl Vehicle {
    pub fn display_name(&self) -> String {
        self.vehicle_spec
            .as_ref()
            .map(|s| s.display_name())
            .unwrap_or_else(|| format!("Vehicle #{}", self.vehicle_id))
    }

    pub fn rental_rate_or_zero(&self) -> f64 {
        self.rental_rate.filter(|r| r.is_finite()).unwrap_or(0.0)
    }
}

/// Payload for creating a vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVehicle {
    #[serde(rename = "rentalRate")]
    pub rental_rate: f64,
    pub availability: bool,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "vehicleSpecId")]
    pub vehicle_spec_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Payload for updating a vehicle. Only set fields are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateVehicle {
    #[serde(rename = "rentalRate", skip_serializing_if = "Option::is_none")]
    pub rental_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<bool>,
    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "vehicleSpecId", skip_serializing_if = "Option::is_none")]
    pub vehicle_spec_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}
