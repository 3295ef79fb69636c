use std::fmt;

use thiserror::Error;

use super::{
    camera::Camera,
    core::{Light, Material, Scene, SceneObject},
    solid::{Sphere, Triangle},
    Vec3,
};

/// Parser for the whitespace separated scene format:
///
/// ```text
/// imageWidth imageHeight
/// px py pz  lx ly lz  ux uy uz  fovDeg focalLength
/// maxDepth numberOfObjects
/// sphere sx sy sz radius  ar ag ab  dr dg db  sr sg sb  shininess
/// tri ax ay az  bx by bz  cx cy cz  ar ag ab  dr dg db  sr sg sb  shininess
/// numberOfLights
/// lpx lpy lpz lpw  lar lag lab  ldr ldg ldb  lsr lsg lsb  constant linear quadratic
/// ```
///
/// `#` starts a comment that runs until the end of the line.
pub struct SceneParser<'a> {
    content: &'a str,
    position: FilePosition,
    token_position: FilePosition,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilePosition {
    pub line: u32,
    pub column: u32,
    index: usize,
}

impl FilePosition {
    fn new() -> Self {
        FilePosition {
            line: 0,
            column: 0,
            index: 0,
        }
    }

    fn on_new_line(&mut self) {
        self.line += 1;
        self.column = 0;
        self.index += 1;
    }

    fn advance(&mut self, c: char) {
        self.column += 1;
        self.index += c.len_utf8();
    }
}

impl fmt::Display for FilePosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("{message} at {position}")]
pub struct ParserError {
    pub position: FilePosition,
    pub message: String,
}

impl ParserError {
    fn new(message: &str, position: FilePosition) -> ParserError {
        ParserError {
            position,
            message: message.to_string(),
        }
    }

    /// Prints the error followed by the offending line and a caret under the token.
    pub fn print_error_location(&self, content: &str) {
        eprintln!("{}", self);
        if let Some(line) = content.lines().nth(self.position.line as usize) {
            eprintln!("{}", line);
            let spacing = " ".repeat(self.position.column as usize);
            eprintln!("{}^", spacing);
        }
    }
}

type ParserResult<T> = Result<T, ParserError>;

/// Everything a scene file describes.
pub struct ImageData {
    pub camera: Camera,
    pub scene: Scene,
    pub max_depth: u32,
}

impl ImageData {
    pub fn width(&self) -> u32 {
        self.camera.image_width
    }

    pub fn height(&self) -> u32 {
        self.camera.image_height
    }
}

impl SceneParser<'_> {
    pub fn new(content: &str) -> SceneParser<'_> {
        SceneParser {
            content,
            position: FilePosition::new(),
            token_position: FilePosition::new(),
        }
    }

    fn get_current_char(&self) -> Option<char> {
        self.content[self.position.index..].chars().next()
    }

    fn is_empty(&self) -> bool {
        self.get_current_char().is_none()
    }

    fn advance(&mut self) -> bool {
        if let Some(current_char) = self.get_current_char() {
            if current_char == '\n' {
                self.position.on_new_line();
            } else {
                self.position.advance(current_char);
            }
            return true;
        }
        false
    }

    fn advance_until(&mut self, f: impl Fn(char) -> bool) {
        while let Some(current_char) = self.get_current_char() {
            if f(current_char) {
                break;
            }
            self.advance();
        }
    }

    fn eat_spaces(&mut self) {
        // consume all the empty lines, spaces and comments before the next token
        while let Some(current_char) = self.get_current_char() {
            if current_char == '#' {
                // the end-of-line itself is consumed at the end of the loop
                self.advance_until(|c| c == '\n');
            } else if !current_char.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    /// Consumes the next whitespace delimited token, empty at the end of the input.
    fn pop(&mut self) -> &str {
        self.eat_spaces();
        self.token_position = self.position;
        let start = self.position.index;
        self.advance_until(|c| c.is_whitespace() || c == '#');
        &self.content[start..self.position.index]
    }

    fn error<T>(&self, message: &str) -> ParserResult<T> {
        Err(ParserError::new(message, self.token_position))
    }

    fn expect_token(&mut self, what: &str) -> ParserResult<String> {
        let token = self.pop().to_string();
        if token.is_empty() {
            return self.error(&format!("unexpected end of file, expected {}", what));
        }
        Ok(token)
    }

    fn parse_float(&mut self, what: &str) -> ParserResult<f64> {
        let token = self.expect_token(what)?;
        match token.parse::<f64>() {
            Ok(num) if num.is_finite() => Ok(num),
            _ => self.error(&format!("cannot interpret '{}' as the {}", token, what)),
        }
    }

    fn parse_unsigned(&mut self, what: &str) -> ParserResult<u32> {
        let token = self.expect_token(what)?;
        if let Ok(num) = token.parse::<u32>() {
            return Ok(num);
        }
        // image sizes are sometimes written as floats, accept them when they are whole
        match token.parse::<f64>() {
            Ok(num) if num >= 0.0 && num.fract() == 0.0 && num <= u32::MAX as f64 => Ok(num as u32),
            _ => self.error(&format!(
                "cannot interpret '{}' as the {} (a non-negative integer)",
                token, what
            )),
        }
    }

    fn parse_vec3(&mut self, what: &str) -> ParserResult<Vec3> {
        let x = self.parse_float(what)?;
        let y = self.parse_float(what)?;
        let z = self.parse_float(what)?;
        Ok(Vec3::new(x, y, z))
    }

    fn parse_material(&mut self) -> ParserResult<Material> {
        let ambient = self.parse_vec3("ambient color")?;
        let diffuse = self.parse_vec3("diffuse color")?;
        let specular = self.parse_vec3("specular color")?;
        let shininess = self.parse_float("shininess")?;
        if shininess < 0.0 {
            return self.error("shininess must not be negative");
        }
        Ok(Material::new(ambient, diffuse, specular, shininess))
    }

    fn parse_sphere(&mut self) -> ParserResult<SceneObject> {
        let center = self.parse_vec3("sphere center")?;
        let radius = self.parse_float("sphere radius")?;
        if radius <= 0.0 {
            return self.error("sphere radius must be positive");
        }
        let material = self.parse_material()?;
        log::debug!("sphere at {:?} with radius {}", center, radius);
        Ok(SceneObject::new(Sphere::new(center, radius), material))
    }

    fn parse_triangle(&mut self) -> ParserResult<SceneObject> {
        let a = self.parse_vec3("triangle vertex")?;
        let b = self.parse_vec3("triangle vertex")?;
        let c = self.parse_vec3("triangle vertex")?;
        let triangle = Triangle::new(a, b, c);
        if triangle.is_degenerate() {
            return self.error("triangle vertices are collinear");
        }
        let material = self.parse_material()?;
        log::debug!("triangle {:?} {:?} {:?}", a, b, c);
        Ok(SceneObject::new(triangle, material))
    }

    fn parse_object(&mut self) -> ParserResult<SceneObject> {
        let kind = self.expect_token("object kind ('sphere' or 'tri')")?;
        match kind.as_str() {
            "sphere" => self.parse_sphere(),
            "tri" => self.parse_triangle(),
            _ => self.error(&format!(
                "unknown object kind '{}', expected 'sphere' or 'tri'",
                kind
            )),
        }
    }

    fn parse_light(&mut self) -> ParserResult<Light> {
        let position = self.parse_vec3("light position")?;
        let w = self.parse_float("light w component")?;
        if w != 0.0 && w != 1.0 {
            return self.error("light w component must be 1 (point) or 0 (directional)");
        }
        if w == 0.0 && position.squared_len() == 0.0 {
            return self.error("directional light needs a non-zero direction");
        }
        let ambient = self.parse_vec3("light ambient intensity")?;
        let diffuse = self.parse_vec3("light diffuse intensity")?;
        let specular = self.parse_vec3("light specular intensity")?;
        let constant = self.parse_float("constant attenuation")?;
        let linear = self.parse_float("linear attenuation")?;
        let quadratic = self.parse_float("quadratic attenuation")?;

        let light = Light::new([position.x, position.y, position.z, w], ambient, diffuse, specular)
            .with_attenuation(constant, linear, quadratic);
        log::debug!("light {:?}", light.kind);
        Ok(light)
    }

    fn parse_camera(&mut self) -> ParserResult<Camera> {
        let width = self.parse_unsigned("image width")?;
        let height = self.parse_unsigned("image height")?;
        if width == 0 || height == 0 {
            return self.error("image size must be positive");
        }

        let position = self.parse_vec3("camera position")?;
        let look_target = self.parse_vec3("camera look target")?;
        let global_up = self.parse_vec3("camera up vector")?;
        if Camera::is_degenerate(position, look_target, global_up) {
            return self.error("camera up vector is parallel to the viewing direction");
        }
        let fov = self.parse_float("field of view")?;
        if fov <= 0.0 || fov >= 180.0 {
            return self.error("field of view must be between 0 and 180 degrees");
        }
        let focal_length = self.parse_float("focal length")?;
        if focal_length <= 0.0 {
            return self.error("focal length must be positive");
        }

        Ok(Camera::look_at(
            position,
            look_target,
            global_up,
            fov.to_radians(),
            focal_length,
            width,
            height,
        ))
    }

    pub fn parse_scene(&mut self) -> ParserResult<ImageData> {
        // main routine that parse the whole file
        let camera = self.parse_camera()?;
        let max_depth = self.parse_unsigned("maximum depth")?;

        let object_count = self.parse_unsigned("number of objects")?;
        let mut objects = Vec::with_capacity(object_count as usize);
        for _ in 0..object_count {
            objects.push(self.parse_object()?);
        }

        let light_count = self.parse_unsigned("number of lights")?;
        let mut lights = Vec::with_capacity(light_count as usize);
        for _ in 0..light_count {
            lights.push(self.parse_light()?);
        }

        self.eat_spaces();
        if !self.is_empty() {
            let token = self.pop().to_string();
            return self.error(&format!("unexpected token '{}' after the last light", token));
        }

        Ok(ImageData {
            camera,
            scene: Scene::new(objects, lights),
            max_depth,
        })
    }
}
