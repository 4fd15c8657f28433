use std::f32::consts::FRAC_PI_2;

use glam::{vec3, Mat4, Quat, Vec3};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn rotated(self, rotation: Quat) -> Self {
        Self { rotation, ..self }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov.to_radians(),
            self.aspect_ratio,
            self.near,
            self.far,
        )
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Shape {
    Sphere {
        radius: f32,
    },
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
    },
    Torus {
        radius: f32,
        tube: f32,
    },
    Cone {
        radius: f32,
        height: f32,
    },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Prop {
    pub name: &'static str,
    pub shape: Shape,
    pub transform: Transform,
    pub color: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Globe {
    pub shell_radius: f32,
    pub shell_tint: Vec3,
    pub shell_opacity: f32,
    pub props: Vec<Prop>,
}

impl Globe {
    pub const SNOW_BASE_Y: f32 = -86.;
    pub const SNOW_BASE_HEIGHT: f32 = 48.;

    pub fn classic() -> Self {
        let props = vec![
            Prop {
                name: "snow base",
                shape: Shape::Cylinder {
                    radius_top: 95.,
                    radius_bottom: 105.,
                    height: Self::SNOW_BASE_HEIGHT,
                },
                transform: Transform::at(vec3(0., Self::SNOW_BASE_Y, 0.)),
                color: hex(0xffffff),
            },
            Prop {
                name: "pedestal",
                shape: Shape::Cylinder {
                    radius_top: 62.,
                    radius_bottom: 70.,
                    height: 28.,
                },
                transform: Transform::at(vec3(0., -110., 0.)),
                color: hex(0xf0f8ff),
            },
            Prop {
                name: "ring",
                shape: Shape::Torus {
                    radius: 72.,
                    tube: 6.,
                },
                transform: Transform::at(vec3(0., -98., 0.))
                    .rotated(Quat::from_rotation_x(FRAC_PI_2)),
                color: hex(0xd0e8ff),
            },
            Prop {
                name: "snowman body",
                shape: Shape::Sphere { radius: 28. },
                transform: Transform::at(vec3(0., -60., 0.)),
                color: hex(0xffffff),
            },
            Prop {
                name: "snowman head",
                shape: Shape::Sphere { radius: 18. },
                transform: Transform::at(vec3(0., -25., 0.)),
                color: hex(0xffffff),
            },
            Prop {
                name: "snowman nose",
                shape: Shape::Cone {
                    radius: 4.,
                    height: 16.,
                },
                transform: Transform::at(vec3(0., -25., 16.))
                    .rotated(Quat::from_rotation_x(FRAC_PI_2)),
                color: hex(0xff8800),
            },
        ];

        Self {
            shell_radius: 120.,
            shell_tint: hex(0xf0f8ff),
            shell_opacity: 0.08,
            props,
        }
    }

    pub fn snow_base(&self) -> Option<&Prop> {
        self.props.iter().find(|prop| prop.name == "snow base")
    }

    pub fn ground_y(&self) -> f32 {
        match self.snow_base() {
            Some(Prop {
                shape: Shape::Cylinder { height, .. },
                transform,
                ..
            }) => transform.position.y + height * 0.5,
            _ => Self::SNOW_BASE_Y + Self::SNOW_BASE_HEIGHT * 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub camera: Camera,
    pub globe: Globe,
    pub background: Vec3,
}

impl Scene {
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            camera: Camera {
                position: vec3(0., 50., 400.),
                target: Vec3::ZERO,
                fov: 60.,
                aspect_ratio,
                near: 0.1,
                far: 1000.,
            },
            globe: Globe::classic(),
            background: hex(0xfff8e8),
        }
    }
}

pub fn hex(rgb: u32) -> Vec3 {
    vec3(
        ((rgb >> 16) & 0xff) as f32 / 255.,
        ((rgb >> 8) & 0xff) as f32 / 255.,
        (rgb & 0xff) as f32 / 255.,
    )
}
