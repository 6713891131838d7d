use regex::Regex;
use std::sync::OnceLock;

use super::Model;
use crate::error::Error;

/// Product names as the engine reports them, and their short names.
const PRODUCTS: &[(&str, &str)] = &[
    ("AC/DC Module", "AC/DC"),
    ("Acoustics Module", "Acoustics"),
    ("Battery Design Module", "Battery Design"),
    ("CAD Import Module", "CAD Import"),
    ("CFD Module", "CFD"),
    ("COMSOL Multiphysics", "Comsol core"),
    ("Chemical Reaction Engineering Module", "Chemical Reaction Engineering"),
    ("Cluster Computing Module", "Cluster Computing"),
    ("Composite Materials Module", "Composite Materials"),
    ("Corrosion Module", "Corrosion"),
    ("Design Module", "Design"),
    ("ECAD Import Module", "ECAD Import"),
    ("Electrochemistry Module", "Electrochemistry"),
    ("Electrodeposition Module", "Electrodeposition"),
    ("Fatigue Module", "Fatigue"),
    ("File Import for CATIA V5", "File Import for Catia v5"),
    ("Fuel Cell & Electrolyzer Module", "Fuel Cell & Electrolyzer"),
    ("Geomechanics Module", "Geomechanics"),
    ("Heat Transfer Module", "Heat Transfer"),
    ("Liquid & Gas Properties Module", "Liquid & Gas Properties"),
    ("LiveLink™ for AutoCAD®", "LiveLink AutoCAD"),
    ("LiveLink™ for PTC® Creo® Parametric™", "LiveLink PTC Creo Parametric"),
    ("LiveLink™ for Excel®", "LiveLink Excel"),
    ("LiveLink™ for Inventor®", "LiveLink Inventor"),
    ("LiveLink™ for MATLAB®", "LiveLink Matlab"),
    ("LiveLink™ for Revit®", "LiveLink Revit"),
    ("LiveLink™ for PTC® Pro/ENGINEER®", "LiveLink PTC Pro/ENGINEER"),
    ("LiveLink™ for Solid Edge®", "LiveLink Solid Edge"),
    ("LiveLink™ for SOLIDWORKS®", "LiveLink SolidWorks"),
    ("MEMS Module", "MEMS"),
    ("Microfluidics Module", "Microfluidics"),
    ("Mixer Module", "Mixer"),
    ("Molecular Flow Module", "Molecular Flow"),
    ("Multibody Dynamics Module", "Multibody Dynamics"),
    ("Nonlinear Structural Materials Module", "Nonlinear Structural Materials"),
    ("Optimization Module", "Optimization"),
    ("Particle Tracing Module", "Particle Tracing"),
    ("Pipe Flow Module", "Pipe Flow"),
    ("Plasma Module", "Plasma"),
    ("Polymer Flow Module", "Polymer Flow"),
    ("Ray Optics Module", "Ray Optics"),
    ("RF Module", "RF"),
    ("Rotordynamics Module", "Rotordynamics"),
    ("Semiconductor Module", "Semiconductor"),
    ("Structural Mechanics Module", "Structural Mechanics"),
    ("Subsurface Flow Module", "Subsurface Flow"),
    ("Wave Optics Module", "Wave Optics"),
];

/// Short name of a product. Unknown products keep their name.
pub fn product_name(product: &str) -> &str {
    PRODUCTS
        .iter()
        .find(|(long, _)| *long == product)
        .map(|(_, short)| *short)
        .unwrap_or(product)
}

fn version_regex() -> Result<&'static Regex, Error> {
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Comsol.+?(\d[0-9.a-z]*)"))
        .as_ref()
        .map_err(|err| Error::Runtime(format!("invalid version pattern: {err}")))
}

/// Version number in a version string such as `COMSOL Multiphysics 6.1.0.282`.
pub(crate) fn parse_version(text: &str) -> Option<String> {
    let captures = version_regex().ok()?.captures(text)?;
    Some(captures.get(1)?.as_str().to_string())
}

impl Model {
    /// Version of the engine the model was last saved with.
    pub fn version(&self) -> Result<String, Error> {
        let text = self.document.engine_version()?;
        parse_version(&text)
            .ok_or_else(|| Error::Runtime(format!("cannot read version number from \"{text}\"")))
    }

    /// Short names of the products needed to work with the model.
    pub fn modules(&self) -> Result<Vec<String>, Error> {
        Ok(self
            .document
            .used_products()?
            .iter()
            .map(|product| product_name(product).to_string())
            .collect())
    }
}
