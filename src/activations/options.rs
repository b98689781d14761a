use serde::{Deserialize, Serialize};

/// Training options of the grid-cell RNN. Their rendering as a run id
/// names the model directory the activations live under.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunOptions {
    #[serde(default = "RunOptions::default_sequence_length")]
    pub sequence_length: u32,
    #[serde(default = "RunOptions::default_batch_size")]
    pub batch_size: u32,
    #[serde(default = "RunOptions::default_rnn_type")]
    pub rnn_type: String,
    /// Number of recurrent units (grid cells).
    #[serde(default = "RunOptions::default_n_g")]
    pub n_g: u32,
    #[serde(default = "RunOptions::default_activation")]
    pub activation: String,
    #[serde(default = "RunOptions::default_place_cell_rf")]
    pub place_cell_rf: f64,
    #[serde(default = "RunOptions::default_dog")]
    pub dog: bool,
    #[serde(default)]
    pub periodic: bool,
    #[serde(default = "RunOptions::default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "RunOptions::default_weight_decay")]
    pub weight_decay: f64,
}

impl RunOptions {
    fn default_sequence_length() -> u32 {
        20
    }
    fn default_batch_size() -> u32 {
        200
    }
    fn default_rnn_type() -> String {
        "RNN".to_string()
    }
    fn default_n_g() -> u32 {
        4096
    }
    fn default_activation() -> String {
        "relu".to_string()
    }
    fn default_place_cell_rf() -> f64 {
        0.12
    }
    fn default_dog() -> bool {
        true
    }
    fn default_learning_rate() -> f64 {
        1e-4
    }
    fn default_weight_decay() -> f64 {
        1e-6
    }

    /// e.g. `steps_20_batch_200_RNN_4096_relu_rf_012_DoG_True_periodic_False_lr_00001_weight_decay_1e-06`
    pub fn run_id(&self) -> String {
        let params = [
            "steps".to_string(),
            self.sequence_length.to_string(),
            "batch".to_string(),
            self.batch_size.to_string(),
            self.rnn_type.clone(),
            self.n_g.to_string(),
            self.activation.clone(),
            "rf".to_string(),
            py_float(self.place_cell_rf),
            "DoG".to_string(),
            py_bool(self.dog).to_string(),
            "periodic".to_string(),
            py_bool(self.periodic).to_string(),
            "lr".to_string(),
            py_float(self.learning_rate),
            "weight_decay".to_string(),
            py_float(self.weight_decay),
        ];
        params.join("_").replace('.', "")
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            sequence_length: Self::default_sequence_length(),
            batch_size: Self::default_batch_size(),
            rnn_type: Self::default_rnn_type(),
            n_g: Self::default_n_g(),
            activation: Self::default_activation(),
            place_cell_rf: Self::default_place_cell_rf(),
            dog: Self::default_dog(),
            periodic: false,
            learning_rate: Self::default_learning_rate(),
            weight_decay: Self::default_weight_decay(),
        }
    }
}

fn py_bool(b: bool) -> &'static str {
    if b { "True" } else { "False" }
}

/// Float formatting used by the training scripts when naming runs:
/// shortest round-trip digits, scientific below 1e-4 or from 1e16 up,
/// exponent with sign and at least two digits.
fn py_float(x: f64) -> String {
    if !x.is_finite() {
        return if x.is_nan() {
            "nan".to_string()
        } else if x > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }
    if x == 0.0 {
        return "0.0".to_string();
    }
    let exp = x.abs().log10().floor() as i32;
    if !(-4..16).contains(&exp) {
        let sci = format!("{x:e}");
        let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exponent),
        };
        return format!("{mantissa}e{sign}{digits:0>2}");
    }
    let plain = format!("{x}");
    if plain.contains('.') {
        plain
    } else {
        format!("{plain}.0")
    }
}
